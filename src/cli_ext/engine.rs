//! Wiring of the prioritization engine for one CLI invocation.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    cli::{AppContext, RequestArgs},
    core::{cache::ResultCache, prioritizer::Prioritizer, request::PrioritizationRequest},
    infra::{
        clock::SystemClock,
        config::{Config, load_config},
        source::DumpBugSource,
        store::JsonFileStore,
    },
};

impl From<RequestArgs> for PrioritizationRequest
{
    fn from(args: RequestArgs) -> Self
    {
        Self {
            agent_id: args.agent,
            assignee: args.assignee,
            components: args.components,
            products: args.products,
            keywords: args.keywords,
        }
    }
}

/// Expand `~` and `$VAR` in a user-supplied path
fn expand(path: &std::path::Path) -> Result<PathBuf>
{
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Configuration with the global path flags applied
pub fn resolve_config(ctx: &AppContext) -> Result<Config>
{
    let explicit = match &ctx.config
    {
        Some(p) => Some(expand(p)?),
        None => None,
    };
    let mut config = load_config(explicit.as_deref())?;

    if let Some(store) = &ctx.store
    {
        config.store.path = store.clone();
    }
    if let Some(source) = &ctx.source
    {
        config.source.dump = source.clone();
    }
    config.store.path = expand(&config.store.path)?;
    config.source.dump = expand(&config.source.dump)?;
    if let Some(words) = &config.keywords.stopwords_file
    {
        config.keywords.stopwords_file = Some(expand(words)?);
    }
    Ok(config)
}

/// Store-only access, for commands that never read the tracker
pub fn open_store(config: &Config) -> Result<JsonFileStore>
{
    JsonFileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open store {}", config.store.path.display()))
}

/// Prioritizer over the configured tracker dump and store
pub fn build(config: &Config) -> Result<Prioritizer>
{
    debug!(dump = %config.source.dump.display(), store = %config.store.path.display(), "Building engine");
    let source = DumpBugSource::open(&config.source.dump)?;
    assemble(config, source)
}

/// Prioritizer for feedback commands; the tracker dump is optional there
pub fn build_offline(config: &Config) -> Result<Prioritizer>
{
    let source = if config
        .source
        .dump
        .is_file()
    {
        DumpBugSource::open(&config.source.dump)?
    }
    else
    {
        DumpBugSource::default()
    };
    assemble(config, source)
}

fn assemble(
    config: &Config,
    source: DumpBugSource,
) -> Result<Prioritizer>
{
    let store = open_store(config)?;
    Prioritizer::new(
        config,
        Arc::new(source),
        Arc::new(store),
        ResultCache::new(&config.cache),
        Arc::new(SystemClock),
    )
}

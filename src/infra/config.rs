use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{AppContext, InitArgs},
    core::{
        cache::CacheConfig, keywords::KeywordConfig, prioritizer::PrioritizerConfig, scorer::ScoringConfig,
        version::default_reserved,
    },
};

/// Config files tried in order when no explicit path is given
const CONFIG_FILES: [&str; 4] = ["reqrank.toml", "reqrank.yaml", "reqrank.json", ".reqrank.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Candidate limits, history depth and output mode
    pub prioritizer: PrioritizerConfig,

    /// Scoring weights and optional dimensions
    pub scoring: ScoringConfig,

    /// Keyword extraction pipeline
    pub keywords: KeywordConfig,

    /// Result and chart caches
    pub cache: CacheConfig,

    /// Experiment variants
    pub versions: VersionsConfig,

    /// Feedback store location
    pub store: StoreConfig,

    /// Tracker dump used by the CLI
    pub source: SourceConfig,

    /// Public link prefixes
    pub links: LinksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig
{
    /// Agent id → forced variant (0 = MAUT, 1 = content-based)
    pub reserved: HashMap<String, u8>,
}

impl Default for VersionsConfig
{
    fn default() -> Self
    {
        Self { reserved: default_reserved() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig
{
    pub path: PathBuf,
}

impl Default for StoreConfig
{
    fn default() -> Self
    {
        Self { path: PathBuf::from(".reqrank/storage.json") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig
{
    pub dump: PathBuf,
}

impl Default for SourceConfig
{
    fn default() -> Self
    {
        Self { dump: PathBuf::from("issues.json") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig
{
    /// Prefix of chart and view URLs
    pub base_url: String,

    /// Tracker page prefix, followed by the issue id
    pub tracker_url: String,
}

impl Default for LinksConfig
{
    fn default() -> Self
    {
        Self {
            base_url: "http://localhost:9002/prioritizer".to_string(),
            tracker_url: "https://bugs.eclipse.org/bugs/show_bug.cgi?id=".to_string(),
        }
    }
}

impl LinksConfig
{
    pub fn tracker_link(
        &self,
        id: u64,
    ) -> String
    {
        format!("{}{id}", self.tracker_url)
    }
}

/// Load configuration from `explicit` or the first config file found in the
/// working directory, then overlay `REQRANK__SECTION__KEY` variables.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None =>
        {
            if let Some(path) = CONFIG_FILES
                .iter()
                .find(|p| Path::new(p).exists())
            {
                builder = builder.add_source(config::File::with_name(path));
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REQRANK")
            .prefix_separator("__")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("reqrank.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::create_dir_all(&args.path)
        .with_context(|| format!("Failed to create {}", args.path.display()))?;
    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::{keywords::TokenizeMode, scorer::PriorityMode, tokenizer::Language};

    #[test]
    fn defaults_match_documented_values()
    {
        let c = Config::default();
        assert_eq!(c.prioritizer.limit, 75);
        assert_eq!(c.prioritizer.refetch_threshold(), 70);
        assert_eq!(c.prioritizer.max_age_years, 7);
        assert_eq!(c.cache.ttl_secs, 10_800);
        assert_eq!(c.cache.max_chart_urls, 1_048_576);
        assert_eq!(c.versions.reserved["a1a1a1a1a"], 0);
        assert_eq!(c.versions.reserved["b2b2b2b2b"], 1);
        assert_eq!(c.keywords.keep_tokens, vec!["c"]);
        assert_eq!(c.links.tracker_link(5), "https://bugs.eclipse.org/bugs/show_bug.cgi?id=5");
    }

    #[test]
    fn default_config_survives_toml()
    {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.store.path, PathBuf::from(".reqrank/storage.json"));
        assert_eq!(back.scoring.preferred_keyword_weight, 3.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("custom.toml");
        std::fs::write(
            &path,
            "[prioritizer]\nlimit = 10\npriority_mode = \"integer\"\n\n[keywords]\nlanguage = \"de\"\ntokenizer = \"regex\"\n",
        )
        .unwrap();

        let c = load_config(Some(&path)).unwrap();
        assert_eq!(c.prioritizer.limit, 10);
        assert_eq!(c.prioritizer.priority_mode, PriorityMode::Integer);
        assert_eq!(c.prioritizer.refetch_slack, 5);
        assert_eq!(c.keywords.language, Language::De);
        assert_eq!(c.keywords.tokenizer, TokenizeMode::Regex);
        assert_eq!(c.cache.max_results, 8_388_608);
    }
}

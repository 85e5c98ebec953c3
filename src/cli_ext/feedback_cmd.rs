//! Feedback and profile command handlers.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::instrument;

use crate::{
    cli::{AppContext, DeferArgs, DeleteProfileArgs, FeedbackArgs},
    cli_ext::engine,
    core::{
        prioritizer::{Feedback, RankPosition},
        request::PrioritizationRequest,
    },
};

/// Which feedback a `FeedbackArgs` command records
#[derive(Debug, Clone, Copy)]
pub enum Verb
{
    Like,
    Unlike,
    Dislike,
    Undislike,
}

impl Verb
{
    fn feedback(self) -> Feedback
    {
        match self
        {
            Verb::Like => Feedback::Like,
            Verb::Unlike => Feedback::Unlike,
            Verb::Dislike => Feedback::Dislike,
            Verb::Undislike => Feedback::Undislike,
        }
    }

    fn past_tense(self) -> &'static str
    {
        match self
        {
            Verb::Like => "Liked",
            Verb::Unlike => "Unliked",
            Verb::Dislike => "Disliked",
            Verb::Undislike => "Lifted dislike of",
        }
    }
}

#[instrument(skip(args, ctx), fields(id = args.id))]
pub fn run(
    verb: Verb,
    args: FeedbackArgs,
    ctx: &AppContext,
) -> Result<()>
{
    record(verb.feedback(), verb.past_tense(), args.request.into(), args.id, ctx)
}

#[instrument(skip_all, fields(id = args.id, days = args.days))]
pub fn defer(
    args: DeferArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let done = format!("Deferred for {} days:", args.days);
    record(Feedback::Defer { interval_days: args.days }, &done, args.request.into(), args.id, ctx)
}

fn record(
    feedback: Feedback,
    done: &str,
    request: PrioritizationRequest,
    id: u64,
    ctx: &AppContext,
) -> Result<()>
{
    let config = engine::resolve_config(ctx)?;
    let prioritizer = engine::build_offline(&config)?;

    let rank = prioritizer
        .record_feedback(feedback, &request, id)
        .with_context(|| format!("Failed to record feedback on issue {id}"))?;

    if !ctx.quiet
    {
        println!("{} issue {}{}", status(done, ctx), id, rank_suffix(rank));
    }
    Ok(())
}

fn status(
    text: &str,
    ctx: &AppContext,
) -> String
{
    if ctx.no_color { text.to_string() } else { text.green().to_string() }
}

fn rank_suffix(rank: Option<RankPosition>) -> String
{
    match rank
    {
        Some(r) => format!(" (ranked #{} at {:.2})", r.position + 1, r.priority),
        None => String::new(),
    }
}

#[instrument(skip_all, fields(agent = %args.agent))]
pub fn delete_profile(
    args: DeleteProfileArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = engine::resolve_config(ctx)?;
    let prioritizer = engine::build_offline(&config)?;
    let removed = prioritizer
        .delete_profile(&args.agent)
        .context("Failed to delete profile")?;

    if !ctx.quiet
    {
        println!("{} {} records of agent {}", status("Removed", ctx), removed, args.agent);
    }
    Ok(())
}

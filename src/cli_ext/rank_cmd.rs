//! `prioritize` and `chart` command handlers.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde_json::json;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::{
    cli::{AppContext, ChartArgs, OutputFormat, PrioritizeArgs},
    cli_ext::engine,
    core::{
        chart::{self, ChartData},
        prioritizer::{PrioritizationOutcome, RankedRequirement},
        request::PrioritizationRequest,
    },
};

#[derive(Tabled)]
struct RankRow
{
    #[tabled(rename = "#")]
    rank: usize,
    id: u64,
    priority: String,
    component: String,
    summary: String,
    #[tabled(rename = "cc")]
    cc_count: usize,
    liked: String,
}

#[derive(Tabled)]
struct KeywordRow
{
    keyword: String,
    count: usize,
}

#[instrument(skip_all)]
pub fn run(
    args: PrioritizeArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = engine::resolve_config(ctx)?;
    let prioritizer = engine::build(&config)?;
    let request = PrioritizationRequest::from(args.request);

    let mut outcome = prioritizer
        .compute_priorities(&request)
        .context("Prioritization failed")?;
    if let Some(top) = args.top
    {
        outcome
            .ranked
            .truncate(top);
    }

    match args.format
    {
        OutputFormat::Json =>
        {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Table => print_table(&outcome, ctx),
        OutputFormat::Text => print_text(&outcome, ctx, &config.links.tracker_url),
    }
    Ok(())
}

fn print_table(
    outcome: &PrioritizationOutcome,
    ctx: &AppContext,
)
{
    let rows: Vec<RankRow> = outcome
        .ranked
        .iter()
        .enumerate()
        .map(|(i, r)| RankRow {
            rank: i + 1,
            id: r.id,
            priority: format!("{:.2}", r.priority),
            component: r
                .component
                .clone(),
            summary: r
                .summary
                .clone(),
            cc_count: r.cc_count,
            liked: if r.liked { "yes".to_string() } else { String::new() },
        })
        .collect();

    println!("{}", Table::new(rows));
    if !ctx.quiet
    {
        eprintln!("{}", summary_line(outcome, ctx));
    }
}

fn print_text(
    outcome: &PrioritizationOutcome,
    ctx: &AppContext,
    tracker_url: &str,
)
{
    for (i, r) in outcome
        .ranked
        .iter()
        .enumerate()
    {
        println!("{}", text_line(i + 1, r, ctx));
        println!("      {tracker_url}{}", r.id);
    }
    if !ctx.quiet
    {
        eprintln!("{}", summary_line(outcome, ctx));
    }
}

fn text_line(
    rank: usize,
    r: &RankedRequirement,
    ctx: &AppContext,
) -> String
{
    let liked = if r.liked { " *" } else { "" };
    if ctx.no_color
    {
        format!("{rank:>3}. [{:>6.2}] #{} {}{liked}", r.priority, r.id, r.summary)
    }
    else
    {
        format!(
            "{:>3}. [{}] {} {}{}",
            rank,
            format!("{:>6.2}", r.priority).green(),
            format!("#{}", r.id).cyan(),
            r.summary,
            liked.yellow()
        )
    }
}

fn summary_line(
    outcome: &PrioritizationOutcome,
    ctx: &AppContext,
) -> String
{
    let text = format!(
        "{} issues ranked (version {}{}{})",
        outcome
            .ranked
            .len(),
        outcome.version,
        if outcome.redirected { ", redirected" } else { "" },
        if outcome.from_cache { ", cached" } else { "" }
    );
    if ctx.no_color { text } else { text.dimmed().to_string() }
}

#[instrument(skip_all)]
pub fn chart(
    args: ChartArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = engine::resolve_config(ctx)?;
    let prioritizer = engine::build(&config)?;
    let request = PrioritizationRequest::from(args.request);

    let url = prioritizer
        .generate_chart_url(&request)
        .context("Failed to generate chart")?;
    let data: ChartData = prioritizer.chart_data_for_key(chart::chart_key_of(&url))?;

    match args.format
    {
        OutputFormat::Json =>
        {
            let output = json!({
                "url": url,
                "keywords": data,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table =>
        {
            println!("{url}");
            let rows: Vec<KeywordRow> = data
                .into_iter()
                .map(|(keyword, count)| KeywordRow { keyword, count })
                .collect();
            println!("{}", Table::new(rows));
        }
        OutputFormat::Text =>
        {
            println!("{url}");
            for (keyword, count) in data
            {
                println!("{count:>5} {keyword}");
            }
        }
    }
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use reqrank::cli::{AppContext, Cli, Commands};
use reqrank::cli_ext::feedback_cmd::{self, Verb};
use reqrank::cli_ext::rank_cmd;

fn main() -> Result<()> {
    let cli = Cli::parse();

    reqrank::infra::logging::init(cli.verbose, cli.quiet, cli.no_color);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        config: cli.config,
        store: cli.store,
        source: cli.source,
    };

    match cli.command {
        Commands::Prioritize(args) => rank_cmd::run(args, &ctx),
        Commands::Like(args) => feedback_cmd::run(Verb::Like, args, &ctx),
        Commands::Unlike(args) => feedback_cmd::run(Verb::Unlike, args, &ctx),
        Commands::Dislike(args) => feedback_cmd::run(Verb::Dislike, args, &ctx),
        Commands::Undislike(args) => feedback_cmd::run(Verb::Undislike, args, &ctx),
        Commands::Defer(args) => feedback_cmd::defer(args, &ctx),
        Commands::DeleteProfile(args) => feedback_cmd::delete_profile(args, &ctx),
        Commands::Chart(args) => rank_cmd::chart(args, &ctx),
        Commands::Init(args) => reqrank::infra::config::init(args, &ctx),
        Commands::Completions(args) => reqrank::completion::run(args, &ctx),
    }
}

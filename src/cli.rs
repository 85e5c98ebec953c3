use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub quiet: bool,             // global --quiet
    pub no_color: bool,          // global --no-color
    pub config: Option<PathBuf>, // global --config
    pub store: Option<PathBuf>,  // global --store
    pub source: Option<PathBuf>, // global --source
}

#[derive(Parser)]
#[command(name = "reqrank")]
#[command(about = "Rank open tracker issues for a stakeholder from their history and feedback")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: reqrank.toml in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Feedback store file, overrides [store].path
    #[arg(long, global = true, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Tracker dump file, overrides [source].dump
    #[arg(long, global = true, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print results and errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank open issues for an agent
    Prioritize(PrioritizeArgs),

    /// Like an issue (boosts it in later rankings)
    Like(FeedbackArgs),

    /// Remove a like
    Unlike(FeedbackArgs),

    /// Hide an issue permanently
    Dislike(FeedbackArgs),

    /// Lift a dislike
    Undislike(FeedbackArgs),

    /// Hide an issue for a number of days
    Defer(DeferArgs),

    /// Remove all feedback and the version assignment of an agent
    DeleteProfile(DeleteProfileArgs),

    /// Create a chart link and print the profile keyword frequencies
    Chart(ChartArgs),

    /// Write a default reqrank.toml
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Who is asking and which slice of the tracker to rank
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Agent (session/user) id that owns the feedback
    #[arg(long)]
    pub agent: String,

    /// Stakeholder e-mail whose history forms the profile
    #[arg(long)]
    pub assignee: String,

    /// Component filter (repeatable)
    #[arg(long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// Product filter (repeatable)
    #[arg(long = "product", value_name = "NAME")]
    pub products: Vec<String>,

    /// Preferred keyword (repeatable, used verbatim)
    #[arg(long = "keyword", value_name = "WORD")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct PrioritizeArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Show only the first N ranked issues
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Issue id
    pub id: u64,
}

#[derive(Args, Debug)]
pub struct DeferArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Issue id
    pub id: u64,

    /// Days to hide the issue
    #[arg(long, default_value_t = 7)]
    pub days: u32,
}

#[derive(Args, Debug)]
pub struct DeleteProfileArgs {
    /// Agent id whose records are removed
    #[arg(long)]
    pub agent: String,
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

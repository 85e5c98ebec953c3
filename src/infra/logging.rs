//! Tracing bootstrap for the binary. Logs go to stderr so stdout stays
//! machine-readable.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive
pub const LOG_ENV: &str = "REQRANK_LOG";

/// Level selected by `-v` occurrences, overridden by `--quiet`
pub fn level_for(
    verbose: u8,
    quiet: bool,
) -> Level
{
    if quiet
    {
        return Level::ERROR;
    }
    match verbose
    {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init(
    verbose: u8,
    quiet: bool,
    no_color: bool,
)
{
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "reqrank={}",
            level_for(verbose, quiet)
                .as_str()
                .to_lowercase()
        ))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .try_init();
}

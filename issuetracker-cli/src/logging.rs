//! Tracing subscriber setup for the CLI

use crate::cli::Cli;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Pick the log level from the global verbosity flags
///
/// `--quiet` wins over `--debug`, which wins over `--verbose`.
pub fn log_level(cli: &Cli) -> Level {
    if cli.quiet {
        Level::ERROR
    } else if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::TRACE
    } else {
        Level::INFO
    }
}

/// Build the event filter, letting `RUST_LOG` override the flag-derived level
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Install the global subscriber writing to stderr
pub fn init_logging(cli: &Cli) {
    let level = log_level(cli);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level))
        .init();
}

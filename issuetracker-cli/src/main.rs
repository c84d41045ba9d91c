use std::process;
mod cli;
mod completions;
mod config;
mod error;
mod exit_codes;
mod logging;
mod serve;
mod signal_handler;

use clap::CommandFactory;
use cli::{Cli, Commands};
use error::handle_cli_result;
use exit_codes::{EXIT_SUCCESS, EXIT_WARNING};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Fast path for help - avoid logger initialization
    if cli.command.is_none() {
        let code = match Cli::command().print_help() {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("Failed to print help: {}", e);
                EXIT_WARNING
            }
        };
        process::exit(code);
    }

    logging::init_logging(&cli);

    let exit_code = match cli.command {
        Some(Commands::Serve(args)) => {
            tracing::debug!("Running serve command");
            handle_cli_result(serve::run_serve(args).await)
        }
        Some(Commands::Config {
            example,
            config: config_file,
        }) => {
            tracing::debug!("Running config command");
            handle_cli_result(config::run_config(example, config_file.as_deref()))
        }
        Some(Commands::Completion { shell }) => {
            tracing::debug!("Generating completion for {:?}", shell);
            handle_cli_result(completions::print_completion(shell))
        }
        None => {
            // This case is handled early above
            unreachable!()
        }
    };

    process::exit(exit_code);
}

//! mdclean CLI - Main entry point

use clap::Parser;
use colored::Colorize;
use mdclean_cli::{Cli, Commands};
use mdclean_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

fn main() {
    // .env values feed clap's `env` fallbacks, so load them first
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Verbose: debug to console. Normal: warnings and errors only.
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("mdclean")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging, so setup failures are not fatal
    let log_guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("{} {}", "Error:".red().bold(), e);
        // Flush file logs; process::exit skips destructors
        drop(log_guard);
        process::exit(1);
    }
}

/// Execute the CLI command
fn execute_command(cli: &Cli) -> mdclean_cli::Result<()> {
    let config = cli.config();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => mdclean_cli::commands::run::run(&config, cli.json),
        Commands::Rules => mdclean_cli::commands::rules::run(&config),
    }
}

//! mdclean CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Cleans a master-data CSV file in one batch run:
//!
//! - **Read** the input CSV ([`reader`])
//! - **Validate** each row against a configurable ruleset ([`rules`], [`validate`])
//! - **Deduplicate** valid rows on their natural key ([`dedupe`])
//! - **Persist** the clean rows to SQLite, replacing the table atomically ([`store`])
//! - **Report** counts and write `clean.csv` / `rejects.csv` / `report.md` ([`report`])
//!
//! [`pipeline::run`] wires the stages together.

pub mod commands;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod report;
pub mod rules;
pub mod store;
pub mod validate;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};
pub use rules::RuleSet;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mdclean - validate, deduplicate and store master-data CSV files
#[derive(Parser, Debug)]
#[command(name = "mdclean")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input CSV file
    #[arg(long, env = "MDCLEAN_INPUT", default_value = config::DEFAULT_INPUT, global = true)]
    pub input: PathBuf,

    /// Directory for clean.csv, rejects.csv and report.md
    #[arg(long, env = "MDCLEAN_OUTPUT_DIR", default_value = config::DEFAULT_OUTPUT_DIR, global = true)]
    pub output_dir: PathBuf,

    /// SQLite database file
    #[arg(long, env = "MDCLEAN_DB", default_value = config::DEFAULT_DB, global = true)]
    pub db: PathBuf,

    /// Table replaced with the clean records
    #[arg(long, env = "MDCLEAN_TABLE", default_value = config::DEFAULT_TABLE, global = true)]
    pub table: String,

    /// Rules file (TOML); built-in employee rules when omitted
    #[arg(long, env = "MDCLEAN_RULES", global = true)]
    pub rules: Option<PathBuf>,

    /// Number of rejection reasons listed in the report
    #[arg(long, default_value_t = report::DEFAULT_TOP_REASONS, global = true)]
    pub top_reasons: usize,

    /// Validate and count without writing the store or output files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

impl Cli {
    /// Resolved run settings
    pub fn config(&self) -> Config {
        Config {
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            db: self.db.clone(),
            table: self.table.clone(),
            rules: self.rules.clone(),
            top_reasons: self.top_reasons,
            dry_run: self.dry_run,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Clean the input file (default)
    Run,

    /// Print the effective ruleset as TOML
    Rules,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_reach_config() {
        let cli = Cli::try_parse_from([
            "mdclean",
            "run",
            "--input",
            "in.csv",
            "--output-dir",
            "out",
            "--table",
            "people",
            "--top-reasons",
            "3",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.command, Some(Commands::Run));
        let config = cli.config();
        assert_eq!(config.input, PathBuf::from("in.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.table, "people");
        assert_eq!(config.top_reasons, 3);
        assert!(config.dry_run);
    }
}

//! Run configuration
//!
//! Built-in defaults, overridable through `MDCLEAN_*` environment variables
//! (a `.env` file is honored) and command-line flags. Clap applies the
//! env/flag layers; this module owns the defaults and the resolved values.

use crate::error::Result;
use crate::report::DEFAULT_TOP_REASONS;
use crate::rules::RuleSet;
use crate::store::validate_table_name;
use serde::Serialize;
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_INPUT: &str = "data/sample_raw.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_DB: &str = "stammdaten.db";
pub const DEFAULT_TABLE: &str = "master_data_clean";

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Input CSV
    pub input: PathBuf,

    /// Directory receiving clean.csv, rejects.csv and report.md
    pub output_dir: PathBuf,

    /// SQLite database file
    pub db: PathBuf,

    /// Table replaced on every run
    pub table: String,

    /// Rules file; built-in rules when absent
    pub rules: Option<PathBuf>,

    /// Reasons listed in the report
    pub top_reasons: usize,

    /// Validate and report counts without writing anything
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            db: PathBuf::from(DEFAULT_DB),
            table: DEFAULT_TABLE.to_string(),
            rules: None,
            top_reasons: DEFAULT_TOP_REASONS,
            dry_run: false,
        }
    }
}

impl Config {
    /// Reject settings that would only fail later
    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.table)
    }

    /// Load the configured ruleset
    pub fn load_rules(&self) -> Result<RuleSet> {
        RuleSet::load(self.rules.as_deref())
    }
}

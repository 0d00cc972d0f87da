//! Error types for the mdclean CLI
//!
//! Every variant is user-facing: the message says what failed and, where
//! there is one, what to do about it. Row-level validation failures are not
//! errors; they become rejects (see [`crate::record::RejectReason`]).

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Input CSV does not exist
    #[error("Input file not found: '{0}'. Pass --input or set MDCLEAN_INPUT.")]
    FileNotFound(String),

    /// Header lacks columns the ruleset needs
    #[error("Input '{path}' is missing required column(s): {missing}. Fix the header or adjust the rules file.")]
    MissingColumns { path: String, missing: String },

    /// Header is empty or has blank/duplicate column names
    #[error("Invalid CSV header in '{path}': {reason}")]
    InvalidHeader { path: String, reason: String },

    /// Rules file content is inconsistent
    #[error("Invalid rules: {0}")]
    InvalidRules(String),

    /// Rules file could not be read
    #[error("Failed to read rules file '{path}': {source}")]
    RulesFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Target table name is not a plain SQL identifier
    #[error("Invalid table name '{0}': use letters, digits and underscores, not starting with a digit; `sqlite_` prefixes and `ingest_runs` are reserved.")]
    InvalidTableName(String),

    /// CSV could not be parsed
    #[error("Failed to read CSV: {0}. Check that the file is UTF-8 and comma-separated.")]
    Csv(#[from] csv::Error),

    /// SQLite open or write failed
    #[error("Storage error: {0}. Check that the database path is writable; the previous table contents were left unchanged.")]
    Storage(#[from] rusqlite::Error),

    /// An output file could not be written
    #[error("Failed to write '{path}': {source}. Check that the output directory is writable.")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("Failed to parse rules TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML rendering failed
    #[error("Failed to render rules as TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),

    /// JSON rendering failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the shared utilities
    #[error(transparent)]
    Common(#[from] mdclean_common::MdError),
}

impl CliError {
    /// Create an invalid rules error
    pub fn invalid_rules(msg: impl Into<String>) -> Self {
        Self::InvalidRules(msg.into())
    }

    /// Create an invalid header error
    pub fn invalid_header(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output write error
    pub fn output(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

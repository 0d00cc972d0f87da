//! Record shapes flowing through the pipeline
//!
//! A row starts as a [`RawRecord`], is classified by the validator into a
//! [`CleanRecord`] or a [`RejectedRecord`], and clean records are then
//! deduplicated on their natural key.

use serde::Serialize;
use std::fmt;

/// One input row, values in header order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Line in the input file; the header is line 1
    pub line: u64,
    pub values: Vec<String>,
    /// Field count differs from the header
    pub ragged: bool,
}

impl RawRecord {
    pub fn new(line: u64, values: Vec<String>, width: usize) -> Self {
        let ragged = values.len() != width;
        Self {
            line,
            values,
            ragged,
        }
    }

    /// Value at `index`, empty if the row is short
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// Required field empty after normalization
    Missing(String),
    /// Value does not match its format
    Malformed(String),
    /// Value parses but lies outside the configured bounds
    OutOfRange(String),
}

impl RejectReason {
    /// Stable code written to `rejects.csv` and the report
    pub fn code(&self) -> String {
        match self {
            RejectReason::Missing(field) => format!("missing_{field}"),
            RejectReason::Malformed(field) => format!("invalid_{field}"),
            RejectReason::OutOfRange(field) => format!("out_of_range_{field}"),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            RejectReason::Missing(f) | RejectReason::Malformed(f) | RejectReason::OutOfRange(f) => f,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// A record that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRecord {
    pub line: u64,
    /// Normalized values in header order
    pub values: Vec<String>,
    /// Natural key used for deduplication
    pub key: String,
}

/// A record that failed validation, with its original values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub line: u64,
    pub values: Vec<String>,
    pub reasons: Vec<RejectReason>,
}

impl RejectedRecord {
    /// Reason codes joined with `;`
    pub fn error_column(&self) -> String {
        self.reasons
            .iter()
            .map(RejectReason::code)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Outcome of validating one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(CleanRecord),
    Rejected(RejectedRecord),
}

/// Occurrences of one rejection code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

//! Natural-key deduplication
//!
//! First occurrence wins. Later records with the same key are dropped as
//! duplicates; their values are never merged into the survivor.

use crate::record::CleanRecord;
use std::collections::HashMap;
use tracing::debug;

/// A dropped record and the line of the record it duplicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub record: CleanRecord,
    pub first_line: u64,
}

/// Result of [`dedupe`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicated {
    /// Survivors, in input order
    pub kept: Vec<CleanRecord>,
    /// Dropped records, in input order
    pub duplicates: Vec<Duplicate>,
}

impl Deduplicated {
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

/// Drop every record whose key was already seen
pub fn dedupe(records: Vec<CleanRecord>) -> Deduplicated {
    let mut first_seen: HashMap<String, u64> = HashMap::with_capacity(records.len());
    let mut result = Deduplicated::default();

    for record in records {
        match first_seen.get(&record.key) {
            Some(&first_line) => {
                debug!(line = record.line, first_line, "Dropping duplicate");
                result.duplicates.push(Duplicate { record, first_line });
            },
            None => {
                first_seen.insert(record.key.clone(), record.line);
                result.kept.push(record);
            },
        }
    }

    result
}

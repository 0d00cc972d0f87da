//! CSV input reader
//!
//! Loads the whole input file into memory. The header must be present and
//! unique ignoring case, since SQLite column names are case-insensitive. Rows with a different field count are kept and flagged so the
//! validator can reject them instead of aborting the run.

use crate::error::{CliError, Result};
use crate::record::RawRecord;
use crate::report::ERROR_COLUMN;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Parsed input file
#[derive(Debug, Clone)]
pub struct InputTable {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl InputTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read `path` into an [`InputTable`]
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_csv(path: impl AsRef<Path>) -> Result<InputTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let table = read_from(file, path)?;

    info!(
        rows = table.len(),
        columns = table.header.len(),
        "Read input file"
    );
    Ok(table)
}

/// Read CSV from any source; `path` is used for messages only
pub fn read_from<R: std::io::Read>(source: R, path: &Path) -> Result<InputTable> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    check_header(&header, &display)?;

    let width = header.len();
    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        // Header occupies line 1; fall back to counting when no position is known
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);
        let record = RawRecord::new(line, row.iter().map(str::to_string).collect(), width);
        if record.ragged {
            debug!(line, fields = record.values.len(), expected = width, "Ragged row");
        }
        records.push(record);
    }

    Ok(InputTable {
        path: path.to_path_buf(),
        header,
        records,
    })
}

fn check_header(header: &[String], path: &str) -> Result<()> {
    if header.is_empty() || header.iter().all(String::is_empty) {
        return Err(CliError::invalid_header(path, "no header row"));
    }

    if let Some(pos) = header.iter().position(String::is_empty) {
        return Err(CliError::invalid_header(
            path,
            format!("column {} has no name", pos + 1),
        ));
    }

    let mut seen = HashSet::new();
    for name in header {
        if name.eq_ignore_ascii_case(ERROR_COLUMN) {
            return Err(CliError::invalid_header(
                path,
                format!("column '{name}' is reserved for the rejection reasons in rejects.csv"),
            ));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(CliError::invalid_header(
                path,
                format!("column '{name}' appears more than once (names are case-insensitive)"),
            ));
        }
    }

    Ok(())
}

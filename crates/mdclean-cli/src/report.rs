//! Run report and split output files
//!
//! Writes `clean.csv`, `rejects.csv` and `report.md` into the output
//! directory. Every file goes to a temporary sibling first and is renamed into
//! place once complete. The report carries no timestamps, so rerunning on the
//! same input reproduces every file byte for byte.

use crate::error::{CliError, Result};
use crate::record::{CleanRecord, ReasonCount, RejectedRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CLEAN_FILE: &str = "clean.csv";
pub const REJECTS_FILE: &str = "rejects.csv";
pub const REPORT_FILE: &str = "report.md";

/// Extra column appended to `rejects.csv`
pub const ERROR_COLUMN: &str = "error";

/// Default number of reasons listed in the report
pub const DEFAULT_TOP_REASONS: usize = 5;

/// Counts describing one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub input_sha256: String,
    pub total: usize,
    pub valid: usize,
    pub rejected: usize,
    pub duplicates: usize,
    /// All reasons, most frequent first
    pub reasons: Vec<ReasonCount>,
}

impl RunSummary {
    /// Every row is clean, rejected or a duplicate
    pub fn is_balanced(&self) -> bool {
        self.valid + self.rejected + self.duplicates == self.total
    }
}

/// Where the output files were written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub clean: PathBuf,
    pub rejects: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            clean: dir.join(CLEAN_FILE),
            rejects: dir.join(REJECTS_FILE),
            report: dir.join(REPORT_FILE),
        }
    }
}

/// Tally reason codes; a record with two reasons counts toward both
///
/// Sorted by count descending, then code ascending.
pub fn reason_counts(rejected: &[RejectedRecord]) -> Vec<ReasonCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for reason in rejected.iter().flat_map(|r| r.reasons.iter()) {
        *counts.entry(reason.code()).or_default() += 1;
    }

    let mut counts: Vec<ReasonCount> = counts
        .into_iter()
        .map(|(reason, count)| ReasonCount { reason, count })
        .collect();
    // Stable sort keeps the BTreeMap's alphabetical order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Render the Markdown report
pub fn render_markdown(summary: &RunSummary, top_reasons: usize) -> String {
    let mut lines = vec![
        "# Master Data Report".to_string(),
        String::new(),
        format!("- Input: `{}`", summary.input.display()),
        format!("- Input SHA-256: `{}`", summary.input_sha256),
        String::new(),
        format!("- Total records: **{}**", summary.total),
        format!("- Valid records: **{}**", summary.valid),
        format!("- Rejected records: **{}**", summary.rejected),
        format!("- Duplicates dropped: **{}**", summary.duplicates),
        String::new(),
        format!("## Rejection reasons (top {top_reasons})"),
        String::new(),
    ];

    if summary.reasons.is_empty() {
        lines.push("- none".to_string());
    } else {
        lines.push("| Reason | Count |".to_string());
        lines.push("|---|---:|".to_string());
        for reason in summary.reasons.iter().take(top_reasons) {
            lines.push(format!("| {} | {} |", reason.reason, reason.count));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write to a temp file in the target's directory, then rename over it
fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let display = path.display().to_string();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CliError::output(&display, e))?;
    fill(tmp.as_file_mut())?;
    tmp.as_file_mut()
        .sync_all()
        .map_err(|e| CliError::output(&display, e))?;
    tmp.persist(path)
        .map_err(|e| CliError::output(&display, e.error))?;
    Ok(())
}

fn write_csv_file<'a, I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<&'a str>>,
{
    write_atomic(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer
            .flush()
            .map_err(|e| CliError::output(path.display().to_string(), e))?;
        Ok(())
    })
}

/// `clean.csv`: input header, normalized values
pub fn write_clean_csv(path: &Path, header: &[String], records: &[CleanRecord]) -> Result<()> {
    write_csv_file(
        path,
        header,
        records
            .iter()
            .map(|r| r.values.iter().map(String::as_str).collect()),
    )
}

/// `rejects.csv`: input header plus `error`, original values
pub fn write_rejects_csv(path: &Path, header: &[String], records: &[RejectedRecord]) -> Result<()> {
    let mut full_header = header.to_vec();
    full_header.push(ERROR_COLUMN.to_string());

    let errors: Vec<String> = records.iter().map(RejectedRecord::error_column).collect();
    write_csv_file(
        path,
        &full_header,
        records.iter().zip(errors.iter()).map(|(r, error)| {
            let mut row: Vec<&str> = r.values.iter().take(header.len()).map(String::as_str).collect();
            row.resize(header.len(), "");
            row.push(error.as_str());
            row
        }),
    )
}

/// Writes all three outputs into one directory
pub struct Reporter {
    paths: OutputPaths,
    top_reasons: usize,
}

impl Reporter {
    /// Create the output directory if needed
    pub fn new(output_dir: impl AsRef<Path>, top_reasons: usize) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)
            .map_err(|e| CliError::output(output_dir.display().to_string(), e))?;
        Ok(Self {
            paths: OutputPaths::in_dir(output_dir),
            top_reasons,
        })
    }

    pub fn write(
        &self,
        summary: &RunSummary,
        header: &[String],
        clean: &[CleanRecord],
        rejected: &[RejectedRecord],
    ) -> Result<&OutputPaths> {
        write_clean_csv(&self.paths.clean, header, clean)?;
        write_rejects_csv(&self.paths.rejects, header, rejected)?;

        let report = render_markdown(summary, self.top_reasons);
        write_atomic(&self.paths.report, |out| {
            out.write_all(report.as_bytes())
                .map_err(|e| CliError::output(self.paths.report.display().to_string(), e))
        })?;

        info!(
            clean = %self.paths.clean.display(),
            rejects = %self.paths.rejects.display(),
            report = %self.paths.report.display(),
            "Wrote outputs"
        );
        Ok(&self.paths)
    }
}

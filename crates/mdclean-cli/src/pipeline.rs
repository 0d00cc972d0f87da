//! End-to-end cleaning run
//!
//! read -> validate -> dedupe -> persist -> report, strictly in that order.
//! Row problems become rejects; anything else aborts the run.

use crate::config::Config;
use crate::dedupe::dedupe;
use crate::error::Result;
use crate::reader::read_csv;
use crate::report::{reason_counts, OutputPaths, Reporter, RunSummary};
use crate::rules::RuleSet;
use crate::store::{RunRecord, SqliteStore};
use crate::validate::Validator;
use mdclean_common::checksum;
use serde::Serialize;
use tracing::{info, info_span, warn};

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// `None` on a dry run
    pub outputs: Option<OutputPaths>,
    /// Rows written to the store; `None` on a dry run
    pub stored_rows: Option<usize>,
    pub table: String,
}

/// Run the pipeline described by `config` with `rules`
pub fn run(config: &Config, rules: &RuleSet) -> Result<RunOutcome> {
    let _span = info_span!("run", input = %config.input.display(), dry_run = config.dry_run).entered();

    let input = read_csv(&config.input)?;
    let input_sha256 = checksum::sha256_file(&config.input)?;
    let validator = Validator::new(rules, &input.header, &config.input.display().to_string())?;

    // Fail on an unwritable output directory before touching the store
    let reporter = if config.dry_run {
        None
    } else {
        Some(Reporter::new(&config.output_dir, config.top_reasons)?)
    };

    let (valid, rejected) = validator.partition(&input.records);
    info!(valid = valid.len(), rejected = rejected.len(), "Validated records");

    let deduped = dedupe(valid);
    if deduped.duplicate_count() > 0 {
        info!(duplicates = deduped.duplicate_count(), "Dropped duplicates");
    }

    let summary = RunSummary {
        input: config.input.clone(),
        input_sha256,
        total: input.len(),
        valid: deduped.kept.len(),
        rejected: rejected.len(),
        duplicates: deduped.duplicate_count(),
        reasons: reason_counts(&rejected),
    };

    if !summary.is_balanced() {
        warn!(?summary, "Record counts do not add up");
    }

    let Some(reporter) = reporter else {
        info!("Dry run: skipping store and output files");
        return Ok(RunOutcome {
            summary,
            outputs: None,
            stored_rows: None,
            table: config.table.clone(),
        });
    };

    let mut store = SqliteStore::open(&config.db)?;
    let stored_rows = store.replace_table(
        &config.table,
        &input.header,
        &deduped.kept,
        &RunRecord {
            run_at: chrono::Utc::now().to_rfc3339(),
            input_path: config.input.display().to_string(),
            input_sha256: summary.input_sha256.clone(),
            table_name: config.table.clone(),
            total: summary.total,
            valid: summary.valid,
            rejected: summary.rejected,
            duplicates: summary.duplicates,
        },
    )?;

    let outputs = reporter
        .write(&summary, &input.header, &deduped.kept, &rejected)?
        .clone();

    Ok(RunOutcome {
        summary,
        outputs: Some(outputs),
        stored_rows: Some(stored_rows),
        table: config.table.clone(),
    })
}

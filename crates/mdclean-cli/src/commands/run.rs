//! `mdclean run` command implementation
//!
//! Runs the cleaning pipeline and prints the KPI summary.

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{self, RunOutcome};
use colored::Colorize;
use tracing::info;

/// Run the pipeline and print its summary
pub fn run(config: &Config, json: bool) -> Result<()> {
    config.validate()?;
    let rules = config.load_rules()?;
    info!(
        rules = %config.rules.as_ref().map_or("built-in".to_string(), |p| p.display().to_string()),
        "Loaded rules"
    );

    let outcome = pipeline::run(config, &rules)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_kpis(&outcome));
    }

    Ok(())
}

/// Human-readable summary
pub fn render_kpis(outcome: &RunOutcome) -> String {
    let s = &outcome.summary;
    let mut out = String::new();

    let status = if s.rejected == 0 {
        "✓".green()
    } else {
        "!".yellow()
    };
    out.push_str(&format!("{} {}\n", status, "KPI:".cyan().bold()));
    out.push_str(&format!("  Total:      {}\n", s.total));
    out.push_str(&format!("  Valid:      {}\n", s.valid));
    out.push_str(&format!("  Rejected:   {}\n", s.rejected));
    out.push_str(&format!("  Duplicates: {}\n", s.duplicates));

    match (&outcome.outputs, outcome.stored_rows) {
        (Some(outputs), Some(rows)) => {
            out.push_str(&format!("  Table:      {} ({} rows)\n", outcome.table, rows));
            out.push_str(&format!("  Clean:      {}\n", outputs.clean.display()));
            out.push_str(&format!("  Rejects:    {}\n", outputs.rejects.display()));
            out.push_str(&format!("  Report:     {}\n", outputs.report.display()));
        },
        _ => out.push_str(&format!("  {}\n", "Dry run: nothing written".dimmed())),
    }

    out
}

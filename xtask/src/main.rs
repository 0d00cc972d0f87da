//! Build automation tasks for mdclean
//!
//! - Generating the CLI reference from the clap definitions
//! - Writing the built-in ruleset out as an editable TOML template

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for mdclean", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },

    /// Write the built-in rules as a TOML template
    DefaultRules {
        /// Destination file
        #[arg(short, long, default_value = "demos/rules.toml")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
        Command::DefaultRules { output } => default_rules(&output)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<mdclean_cli::Cli>();

    let content = format!(
        r#"# mdclean CLI Reference

This documentation is auto-generated from the CLI source code. Last updated: {}.

## Overview

mdclean cleans a master-data CSV file in one batch run. Rows are validated
against a ruleset, deduplicated on their natural key and written to a SQLite
table that is replaced atomically. Every run also writes `clean.csv`,
`rejects.csv` and `report.md` into the output directory.

## Quick Start

```bash
# Clean the sample file with the built-in employee rules
mdclean --input data/sample_raw.csv --output-dir data

# Check counts without writing anything
mdclean --dry-run

# Use a custom ruleset
mdclean rules > my-rules.toml
mdclean --rules my-rules.toml --table customers
```

## Commands

{}

## Environment Variables

- `MDCLEAN_INPUT` - Input CSV (default: `data/sample_raw.csv`)
- `MDCLEAN_OUTPUT_DIR` - Output directory (default: `data`)
- `MDCLEAN_DB` - SQLite database file (default: `stammdaten.db`)
- `MDCLEAN_TABLE` - Target table (default: `master_data_clean`)
- `MDCLEAN_RULES` - Rules file (default: built-in rules)
- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`, `LOG_FILTER` - Logging

A `.env` file in the working directory is loaded before flags are parsed.

## Exit Codes

- `0` - Run completed; rejected rows do not fail a run
- `1` - Fatal error (missing input, missing columns, bad rules, storage or output failure)
- `2` - Invalid command-line usage

---

*This documentation is automatically generated from the CLI source code. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}

fn default_rules(output: &str) -> anyhow::Result<()> {
    let toml = mdclean_cli::RuleSet::default().to_toml()?;

    let path = PathBuf::from(output);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, toml)?;

    println!("✅ Wrote default rules to: {}", path.display());

    Ok(())
}

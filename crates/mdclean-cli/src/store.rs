//! SQLite persistence
//!
//! The clean table is replaced wholesale on every run. New rows go into a
//! staging table first; the old table is dropped and the staging table renamed
//! inside the same transaction, so readers see either the previous contents
//! or the new ones, never a mix.
//!
//! Each successful replace also appends one row to `ingest_runs`.

use crate::error::{CliError, Result};
use crate::record::CleanRecord;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Run-history table
pub const RUNS_TABLE: &str = "ingest_runs";

const STAGING_SUFFIX: &str = "__staging";

const SQLITE_RESERVED_PREFIX: &str = "sqlite_";

/// Counts and provenance recorded for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub run_at: String,
    pub input_path: String,
    pub input_sha256: String,
    pub table_name: String,
    pub total: usize,
    pub valid: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Create the run-history table if needed
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_at TEXT NOT NULL,
            input_path TEXT NOT NULL,
            input_sha256 TEXT NOT NULL,
            table_name TEXT NOT NULL,
            total INTEGER NOT NULL,
            valid INTEGER NOT NULL,
            rejected INTEGER NOT NULL,
            duplicates INTEGER NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_table ON ingest_runs(table_name)",
        [],
    )?;

    Ok(())
}

/// Check that `name` is a plain identifier
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    // SQLite reserves the sqlite_ prefix for internal objects
    let reserved = name.eq_ignore_ascii_case(RUNS_TABLE)
        || name
            .get(..SQLITE_RESERVED_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(SQLITE_RESERVED_PREFIX));

    if valid_start && valid_rest && !reserved {
        Ok(())
    } else {
        Err(CliError::InvalidTableName(name.to_string()))
    }
}

/// Double-quote an identifier for SQLite
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Handle on the SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        debug!(path = %path.display(), "Opened database");
        Ok(Self { conn })
    }

    /// In-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace `table` with `records` and log the run, atomically
    ///
    /// Returns the number of rows written. On error nothing is changed.
    #[instrument(skip(self, columns, records, run), fields(rows = records.len()))]
    pub fn replace_table(
        &mut self,
        table: &str,
        columns: &[String],
        records: &[CleanRecord],
        run: &RunRecord,
    ) -> Result<usize> {
        validate_table_name(table)?;

        let target = quote_ident(table);
        let staging = quote_ident(&format!("{table}{STAGING_SUFFIX}"));
        let column_defs = columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {staging}; CREATE TABLE {staging} ({column_defs});"
        ))?;

        {
            let mut insert = tx.prepare(&format!("INSERT INTO {staging} VALUES ({placeholders})"))?;
            for record in records {
                insert.execute(params_from_iter(record.values.iter()))?;
            }
        }

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {target}; ALTER TABLE {staging} RENAME TO {target};"
        ))?;

        tx.execute(
            r#"
            INSERT INTO ingest_runs (
                run_at, input_path, input_sha256, table_name,
                total, valid, rejected, duplicates
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.run_at,
                run.input_path,
                run.input_sha256,
                run.table_name,
                run.total as i64,
                run.valid as i64,
                run.rejected as i64,
                run.duplicates as i64,
            ],
        )?;

        tx.commit()?;

        info!(table, rows = records.len(), "Replaced table");
        Ok(records.len())
    }

    /// Row count of `table`
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        validate_table_name(table)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Most recent run for `table`, if any
    pub fn last_run(&self, table: &str) -> Result<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                r#"
                SELECT run_at, input_path, input_sha256, table_name,
                       total, valid, rejected, duplicates
                FROM ingest_runs
                WHERE table_name = ?1
                ORDER BY id DESC
                LIMIT 1
                "#,
                [table],
                |row| {
                    Ok(RunRecord {
                        run_at: row.get(0)?,
                        input_path: row.get(1)?,
                        input_sha256: row.get(2)?,
                        table_name: row.get(3)?,
                        total: row.get::<_, i64>(4)? as usize,
                        valid: row.get::<_, i64>(5)? as usize,
                        rejected: row.get::<_, i64>(6)? as usize,
                        duplicates: row.get::<_, i64>(7)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }
}

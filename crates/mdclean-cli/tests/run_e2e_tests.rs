//! End-to-end tests for the mdclean binary
//!
//! These tests run the compiled CLI against files in a scratch directory and
//! check:
//! - Split outputs (clean.csv, rejects.csv, report.md)
//! - Table contents after one and several runs
//! - Deterministic reruns
//! - Fatal error handling and exit codes
//! - Dry run, JSON summary and the `rules` subcommand

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ID_NAME_RULES: &str = r#"
key_fields = ["id"]

[[fields]]
name = "id"
required = true

[[fields]]
name = "name"
required = true
"#;

const EMPLOYEES: &str = "\
id,name,email,role,start_date,active
1, Ada  Lovelace ,ada@example.com,Engineer,15.05.2023,yes
2,Grace Hopper,grace@example,Admiral,2023-01-01,true
3,Alan Turing,alan@example.com,,2022-02-30,maybe
1,Ada Lovelace,ada@other.com,Engineer,2023-05-15,1
4,Katherine Johnson,kj@example.com,Analyst,01/02/2021,N
";

/// Scratch workspace with an input file and isolated environment
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(input: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("input.csv"), input).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("mdclean").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("MDCLEAN_INPUT")
            .env_remove("MDCLEAN_OUTPUT_DIR")
            .env_remove("MDCLEAN_DB")
            .env_remove("MDCLEAN_TABLE")
            .env_remove("MDCLEAN_RULES")
            .env_remove("LOG_LEVEL")
            .env_remove("LOG_OUTPUT")
            .arg("--input")
            .arg(self.path("input.csv"))
            .arg("--output-dir")
            .arg(self.path("out"))
            .arg("--db")
            .arg(self.path("store.db"));
        cmd
    }
}

fn table_rows(db: &Path, table: &str) -> Vec<Vec<String>> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))
        .unwrap();
    let width = stmt.column_count();
    stmt.query_map([], |row| {
        (0..width)
            .map(|i| row.get::<_, String>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
    })
    .unwrap()
    .collect::<rusqlite::Result<Vec<_>>>()
    .unwrap()
}

// ============================================================================
// Pipeline Outputs
// ============================================================================

#[test]
fn test_duplicate_and_missing_required_field() {
    let ws = Workspace::new("id,name\n1,A\n1,A\n2,\n");
    let rules = ws.write("rules.toml", ID_NAME_RULES);

    ws.cmd()
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total:      3"))
        .stdout(predicate::str::contains("Valid:      1"))
        .stdout(predicate::str::contains("Rejected:   1"))
        .stdout(predicate::str::contains("Duplicates: 1"));

    assert_eq!(ws.read("out/clean.csv"), "id,name\n1,A\n");
    assert_eq!(ws.read("out/rejects.csv"), "id,name,error\n2,,missing_name\n");
    assert_eq!(
        table_rows(&ws.path("store.db"), "master_data_clean"),
        vec![vec!["1".to_string(), "A".to_string()]]
    );

    let report = ws.read("out/report.md");
    assert!(report.contains("- Total records: **3**"));
    assert!(report.contains("| missing_name | 1 |"));
}

#[test]
fn test_default_rules_normalize_employee_data() {
    let ws = Workspace::new(EMPLOYEES);

    ws.cmd().assert().success();

    assert_eq!(
        ws.read("out/clean.csv"),
        "id,name,email,role,start_date,active\n\
         1,Ada Lovelace,ada@example.com,Engineer,2023-05-15,true\n\
         4,Katherine Johnson,kj@example.com,Analyst,2021-02-01,false\n"
    );
    assert_eq!(
        ws.read("out/rejects.csv"),
        "id,name,email,role,start_date,active,error\n\
         2,Grace Hopper,grace@example,Admiral,2023-01-01,true,invalid_email\n\
         3,Alan Turing,alan@example.com,,2022-02-30,maybe,missing_role;invalid_start_date;invalid_active\n"
    );
    assert_eq!(table_rows(&ws.path("store.db"), "master_data_clean").len(), 2);
}

#[test]
fn test_rerun_is_deterministic() {
    let ws = Workspace::new(EMPLOYEES);

    ws.cmd().assert().success();
    let first: Vec<String> = ["out/clean.csv", "out/rejects.csv", "out/report.md"]
        .iter()
        .map(|f| ws.read(f))
        .collect();

    ws.cmd().assert().success();
    let second: Vec<String> = ["out/clean.csv", "out/rejects.csv", "out/report.md"]
        .iter()
        .map(|f| ws.read(f))
        .collect();

    assert_eq!(first, second);
    assert_eq!(table_rows(&ws.path("store.db"), "master_data_clean").len(), 2);
}

#[test]
fn test_rerun_replaces_previous_table() {
    let ws = Workspace::new(EMPLOYEES);
    ws.cmd().assert().success();

    ws.write(
        "input.csv",
        "id,name,email,role,start_date,active\n9,Zed,zed@example.com,Ops,2020-01-01,y\n",
    );
    ws.cmd().assert().success();

    let rows = table_rows(&ws.path("store.db"), "master_data_clean");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "9");

    let conn = Connection::open(ws.path("store.db")).unwrap();
    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM ingest_runs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(runs, 2);
}

#[test]
fn test_custom_table_name() {
    let ws = Workspace::new(EMPLOYEES);
    ws.cmd().arg("--table").arg("employees").assert().success();
    assert_eq!(table_rows(&ws.path("store.db"), "employees").len(), 2);
}

// ============================================================================
// Output Modes
// ============================================================================

#[test]
fn test_json_summary() {
    let ws = Workspace::new(EMPLOYEES);
    let output = ws.cmd().arg("--json").output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["total"], 5);
    assert_eq!(json["summary"]["valid"], 2);
    assert_eq!(json["summary"]["rejected"], 2);
    assert_eq!(json["summary"]["duplicates"], 1);
    assert_eq!(json["stored_rows"], 2);
    assert_eq!(json["summary"]["reasons"][0]["count"], 1);
}

#[test]
fn test_dry_run_writes_nothing() {
    let ws = Workspace::new(EMPLOYEES);

    ws.cmd()
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!ws.path("out").exists());
    assert!(!ws.path("store.db").exists());
}

#[test]
fn test_rules_subcommand_prints_toml() {
    let ws = Workspace::new(EMPLOYEES);

    ws.cmd()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("key_fields"))
        .stdout(predicate::str::contains("type = \"email\""))
        .stdout(predicate::str::contains("start_date"));
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_missing_input_fails() {
    let ws = Workspace::new(EMPLOYEES);
    std::fs::remove_file(ws.path("input.csv")).unwrap();

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_missing_columns_fail() {
    let ws = Workspace::new("id,name\n1,A\n");

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing required column(s): email, role, start_date, active"));

    assert!(!ws.path("store.db").exists());
}

#[test]
fn test_invalid_rules_fail() {
    let ws = Workspace::new(EMPLOYEES);
    let rules = ws.write("rules.toml", "key_fields = []\n");

    ws.cmd()
        .arg("--rules")
        .arg(&rules)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid rules"));
}

#[test]
fn test_invalid_table_name_fails() {
    let ws = Workspace::new(EMPLOYEES);

    ws.cmd()
        .arg("--table")
        .arg("clean; DROP TABLE x")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid table name"));
}

#[test]
fn test_reserved_table_prefix_fails_before_writing() {
    let ws = Workspace::new(EMPLOYEES);

    ws.cmd()
        .arg("--table")
        .arg("sqlite_data")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid table name"));

    assert!(!ws.path("out").exists());
}

#[test]
fn test_case_insensitive_duplicate_header_fails() {
    let ws = Workspace::new("id,Name,name\n1,A,a\n");

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid CSV header"))
        .stderr(predicate::str::contains("Storage error").not());

    assert!(!ws.path("store.db").exists());
}

#[test]
fn test_blank_optional_key_rows_are_rejected_not_merged() {
    let ws = Workspace::new("id,email,name\n1,,Ann\n2,,Bob\n3,,Cid\n");
    let rules = ws.write(
        "rules.toml",
        "key_fields = [\"email\"]\n\n[[fields]]\nname = \"id\"\nrequired = true\n\n[[fields]]\nname = \"email\"\n",
    );

    ws.cmd()
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rejected:   3"))
        .stdout(predicate::str::contains("Duplicates: 0"));

    assert_eq!(
        ws.read("out/rejects.csv"),
        "id,email,name,error\n1,,Ann,missing_email\n2,,Bob,missing_email\n3,,Cid,missing_email\n"
    );
}

#[test]
fn test_unwritable_output_dir_fails() {
    let ws = Workspace::new(EMPLOYEES);
    // A regular file where the output directory should be
    ws.write("out", "not a directory");

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to write"));

    assert!(!ws.path("store.db").exists());
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let ws = Workspace::new(EMPLOYEES);
    ws.cmd().arg("--bogus").assert().code(2);
}

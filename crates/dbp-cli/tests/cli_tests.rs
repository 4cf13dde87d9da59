//! End-to-end tests for the dbpatch binary
//!
//! Each test writes patch files to a temp directory and runs the compiled
//! binary against a DuckDB file in the same directory.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Path to the compiled dbpatch binary
fn dbpatch_bin() -> String {
    env!("CARGO_BIN_EXE_dbpatch").to_string()
}

/// Run `dbpatch` in `dir` and return (stdout, stderr, success).
fn run_dbpatch(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(dbpatch_bin())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute dbpatch with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let patches = temp.path().join("patches");
    std::fs::create_dir(&patches).unwrap();
    std::fs::write(
        patches.join("1.0.0.create.sql"),
        "CREATE TABLE items (id INT);\n",
    )
    .unwrap();
    std::fs::write(
        patches.join("1.0.1.seed.sql"),
        "-- {\"minRecords\": 2}\nINSERT INTO items VALUES (1), (2);\n",
    )
    .unwrap();
    std::fs::write(
        temp.path().join("dbpatch.yml"),
        "table_prefix: cli\ndatabase:\n  path: app.duckdb\n",
    )
    .unwrap();
    temp
}

// ── apply ──────────────────────────────────────────────────────────────

#[test]
fn test_apply_then_rerun() {
    let temp = project();

    let (stdout, stderr, success) = run_dbpatch(temp.path(), &["apply"]);
    assert!(success, "apply failed: {stderr}");
    assert!(stdout.contains("Applied 2 patch(es), skipped 0"));
    assert!(stderr.contains("Checking patch: 1.0.0.create.sql"));
    assert!(stderr.contains("Process finished."));

    let (stdout, stderr, success) = run_dbpatch(temp.path(), &["apply"]);
    assert!(success, "second apply failed: {stderr}");
    assert!(stdout.contains("Applied 0 patch(es), skipped 2"));
    assert!(stderr.contains("Patch already applied on"));
}

#[test]
fn test_apply_fails_on_bad_file_name() {
    let temp = project();
    std::fs::write(temp.path().join("patches/1.x.0.bad.sql"), "SELECT 1;\n").unwrap();

    let (_, stderr, success) = run_dbpatch(temp.path(), &["apply"]);

    assert!(!success);
    assert!(stderr.contains("[P001]"));
    assert!(stderr.contains("Minor"));
}

#[test]
fn test_apply_fails_on_row_count_violation() {
    let temp = project();
    std::fs::write(
        temp.path().join("patches/1.0.2.delete.sql"),
        "--{\"maxRecords\": 0}\nDELETE FROM items;\n",
    )
    .unwrap();

    let (stdout, stderr, success) = run_dbpatch(temp.path(), &["apply"]);

    assert!(!success);
    assert!(stderr.contains("[R001]"));
    assert!(!stdout.contains("Applied"));

    let (stdout, _, success) = run_dbpatch(temp.path(), &["status"]);
    assert!(success);
    assert!(stdout.contains("Applied patches (2):"));
    assert!(stdout.contains("Pending patches (1):"));
}

#[test]
fn test_apply_requires_table_prefix() {
    let temp = project();
    std::fs::remove_file(temp.path().join("dbpatch.yml")).unwrap();

    let (_, stderr, success) = run_dbpatch(temp.path(), &["apply"]);

    assert!(!success);
    assert!(stderr.contains("table_prefix"));
}

// ── logging ────────────────────────────────────────────────────────────

#[test]
fn test_log_file_captures_progress() {
    let temp = project();

    let (stdout, stderr, success) =
        run_dbpatch(temp.path(), &["apply", "--log-file", "logs/apply.log"]);

    assert!(success, "apply failed: {stderr}");
    assert!(stdout.contains("Log file saved to logs/apply.log"));
    assert!(!stderr.contains("Checking patch"));
    let log = std::fs::read_to_string(temp.path().join("logs/apply.log")).unwrap();
    assert!(log.contains("Checking patch: 1.0.1.seed.sql"));
    assert!(log.contains("2 rows affected"));
}

#[test]
fn test_log_file_with_tee() {
    let temp = project();

    let (_, stderr, success) = run_dbpatch(
        temp.path(),
        &["apply", "--log-file", "apply.log", "--tee"],
    );

    assert!(success, "apply failed: {stderr}");
    assert!(stderr.contains("Process finished."));
    let log = std::fs::read_to_string(temp.path().join("apply.log")).unwrap();
    assert!(log.contains("Process finished."));
}

// ── status ─────────────────────────────────────────────────────────────

#[test]
fn test_status_before_apply() {
    let temp = project();

    let (stdout, stderr, success) = run_dbpatch(temp.path(), &["status"]);

    assert!(success, "status failed: {stderr}");
    assert!(stdout.contains("Applied patches (0):"));
    assert!(stdout.contains("Pending patches (2):"));
    assert!(stdout.contains("1.0.1.seed.sql"));
}

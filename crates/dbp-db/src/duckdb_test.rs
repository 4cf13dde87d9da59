use super::*;
use tempfile::TempDir;

const TABLE: &str = "schema_change_log_test";

fn session() -> DuckDbSession {
    let mut db = DuckDbSession::in_memory(TABLE).unwrap();
    db.ensure_table(false).unwrap();
    db
}

fn count(db: &DuckDbSession, sql: &str) -> i64 {
    db.conn()
        .query_row(sql, [], |row| row.get::<_, i64>(0))
        .unwrap()
}

fn entry<'a>(identity: PatchIdentity, file_name: &'a str, sql: &'a str) -> NewLedgerEntry<'a> {
    NewLedgerEntry {
        identity,
        file_name,
        rows_affected: 3,
        executed_sql: sql,
    }
}

// ── Construction ───────────────────────────────────────────────────────

#[test]
fn test_rejects_unsafe_table_name() {
    let result = DuckDbSession::in_memory("bad\"name");
    assert!(matches!(result, Err(DbError::InvalidIdentifier(_))));
}

#[test]
fn test_new_memory_special_case() {
    let db = DuckDbSession::new(":memory:", TABLE).unwrap();
    assert_eq!(db.ledger_table(), TABLE);
}

// ── Session ────────────────────────────────────────────────────────────

#[test]
fn test_execute_reports_row_counts() {
    let mut db = session();
    db.execute("CREATE TABLE t (id INT)").unwrap();
    let rows = db
        .execute("INSERT INTO t VALUES (1), (2);\nINSERT INTO t VALUES (3);\n")
        .unwrap();
    assert_eq!(rows, Some(3));
    assert_eq!(db.execute("UPDATE t SET id = id + 1").unwrap(), Some(3));
}

#[test]
fn test_execute_comment_only_batch_has_no_count() {
    let mut db = session();
    assert_eq!(db.execute("-- nothing to run\n\n").unwrap(), None);
}

#[test]
fn test_execute_error_includes_statement() {
    let mut db = session();
    let err = db.execute("INSERT INTO missing_table VALUES (1)").unwrap_err();
    match err {
        DbError::ExecutionError(msg) => assert!(msg.contains("missing_table")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_transaction_commits_on_success() {
    let mut db = session();
    db.execute("CREATE TABLE t (id INT)").unwrap();
    let result: DbResult<()> = with_transaction(&mut db, |s: &mut DuckDbSession| {
        s.execute("INSERT INTO t VALUES (1)")?;
        Ok(())
    });
    result.unwrap();
    assert_eq!(count(&db, "SELECT COUNT(*) FROM t"), 1);
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let mut db = session();
    db.execute("CREATE TABLE t (id INT)").unwrap();
    let result: DbResult<()> = with_transaction(&mut db, |s: &mut DuckDbSession| {
        s.execute("INSERT INTO t VALUES (1)")?;
        Err(DbError::ExecutionError("intentional failure".into()))
    });
    assert!(result.is_err());
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM t"),
        0,
        "Row should have been rolled back"
    );
}

#[test]
fn test_ddl_rolls_back() {
    let mut db = session();
    let result: DbResult<()> = with_transaction(&mut db, |s: &mut DuckDbSession| {
        s.execute("CREATE TABLE created_in_tx (id INT)")?;
        Err(DbError::ExecutionError("abort".into()))
    });
    assert!(result.is_err());
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'created_in_tx'"
        ),
        0
    );
}

#[test]
fn test_nested_begin_rejected() {
    let mut db = session();
    db.begin().unwrap();
    assert!(matches!(db.begin(), Err(DbError::TransactionError(_))));
    db.rollback().unwrap();
}

// ── Ledger ─────────────────────────────────────────────────────────────

#[test]
fn test_lookup_unapplied_is_none() {
    let mut db = session();
    assert_eq!(db.lookup(PatchIdentity::new(1, 0, 0)).unwrap(), None);
}

#[test]
fn test_record_then_lookup() {
    let mut db = session();
    let id = PatchIdentity::new(1, 2, 3);
    db.record(&entry(id, "1.2.3.init.sql", "SELECT 1;\n")).unwrap();

    assert!(db.lookup(id).unwrap().is_some());
    assert_eq!(db.lookup(PatchIdentity::new(1, 2, 4)).unwrap(), None);

    let entries = db.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].identity, id);
    assert_eq!(entries[0].file_name, "1.2.3.init.sql");
    assert_eq!(entries[0].rows_affected, 3);
    assert_eq!(entries[0].executed_sql, "SELECT 1;\n");
}

#[test]
fn test_entries_sorted_by_identity() {
    let mut db = session();
    db.record(&entry(PatchIdentity::new(1, 10, 0), "b.sql", "")).unwrap();
    db.record(&entry(PatchIdentity::new(1, 2, 0), "a.sql", "")).unwrap();
    let ids: Vec<PatchIdentity> = db.entries().unwrap().iter().map(|e| e.identity).collect();
    assert_eq!(
        ids,
        vec![PatchIdentity::new(1, 2, 0), PatchIdentity::new(1, 10, 0)]
    );
}

#[test]
fn test_large_version_numbers_round_trip() {
    let mut db = session();
    let id = PatchIdentity::new(u32::MAX, 0, 1);
    db.record(&entry(id, "big.sql", "")).unwrap();
    assert!(db.lookup(id).unwrap().is_some());
    assert_eq!(db.entries().unwrap()[0].identity, id);
}

#[test]
fn test_ensure_table_is_idempotent() {
    let mut db = session();
    db.record(&entry(PatchIdentity::new(1, 0, 0), "x.sql", "")).unwrap();
    db.ensure_table(false).unwrap();
    assert_eq!(db.entries().unwrap().len(), 1);
}

#[test]
fn test_reset_drops_history() {
    let mut db = session();
    db.record(&entry(PatchIdentity::new(1, 0, 0), "x.sql", "")).unwrap();
    db.ensure_table(true).unwrap();
    assert!(db.entries().unwrap().is_empty());
}

#[test]
fn test_ledger_persists_across_connections() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("patches.duckdb");
    let id = PatchIdentity::new(3, 1, 4);

    {
        let mut db = DuckDbSession::open(&path, TABLE).unwrap();
        db.ensure_table(false).unwrap();
        db.record(&entry(id, "3.1.4.sql", "")).unwrap();
    }

    let mut db = DuckDbSession::open(&path, TABLE).unwrap();
    db.ensure_table(false).unwrap();
    assert!(db.lookup(id).unwrap().is_some());
}

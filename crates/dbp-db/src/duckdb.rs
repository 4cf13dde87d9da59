//! DuckDB session and ledger implementation

use crate::error::{DbError, DbResult};
use crate::statements::split_statements;
use crate::traits::{with_transaction, Ledger, LedgerEntry, NewLedgerEntry, Session};
use chrono::NaiveDateTime;
use dbp_core::sql_utils::{is_identifier_fragment, quote_ident};
use dbp_core::PatchIdentity;
use duckdb::Connection;
use std::path::Path;

/// Format DuckDB uses when casting a TIMESTAMP to VARCHAR.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// DuckDB-backed [`Session`] and [`Ledger`] over a single connection.
///
/// Single-threaded: patches are applied sequentially, so no `Mutex` is held.
pub struct DuckDbSession {
    conn: Connection,
    ledger_table: String,
    in_transaction: bool,
}

impl DuckDbSession {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path, ledger_table: &str) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Self::with_connection(conn, ledger_table)
    }

    /// Create an in-memory database.
    pub fn in_memory(ledger_table: &str) -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Self::with_connection(conn, ledger_table)
    }

    /// Open from a path string (handles the `:memory:` special case).
    pub fn new(path: &str, ledger_table: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory(ledger_table)
        } else {
            Self::open(Path::new(path), ledger_table)
        }
    }

    fn with_connection(conn: Connection, ledger_table: &str) -> DbResult<Self> {
        if !is_identifier_fragment(ledger_table) {
            return Err(DbError::InvalidIdentifier(ledger_table.to_string()));
        }
        Ok(Self {
            conn,
            ledger_table: ledger_table.to_string(),
            in_transaction: false,
        })
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn ledger_table(&self) -> &str {
        &self.ledger_table
    }

    fn quoted_table(&self) -> String {
        quote_ident(&self.ledger_table)
    }

    fn exec_control(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::TransactionError(format!("{sql} failed: {e}")))
    }
}

impl Session for DuckDbSession {
    fn begin(&mut self) -> DbResult<()> {
        if self.in_transaction {
            return Err(DbError::TransactionError(
                "a transaction is already open".to_string(),
            ));
        }
        self.exec_control("BEGIN TRANSACTION")?;
        self.in_transaction = true;
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> DbResult<Option<u64>> {
        let statements = split_statements(sql);
        if statements.is_empty() {
            return Ok(None);
        }

        let mut total: u64 = 0;
        for statement in statements {
            let rows = self
                .conn
                .execute(statement, [])
                .map_err(|e| DbError::ExecutionError(format!("{e}: {}", statement.trim())))?;
            total += rows as u64;
        }
        Ok(Some(total))
    }

    fn commit(&mut self) -> DbResult<()> {
        self.in_transaction = false;
        self.exec_control("COMMIT")
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.in_transaction = false;
        self.exec_control("ROLLBACK")
    }
}

impl Ledger for DuckDbSession {
    fn ensure_table(&mut self, reset: bool) -> DbResult<()> {
        let table = self.quoted_table();
        with_transaction(self, |session: &mut DuckDbSession| {
            if reset {
                log::info!("Dropping ledger table {}", session.ledger_table);
                session
                    .conn
                    .execute_batch(&format!("DROP TABLE IF EXISTS {table}"))
                    .map_err(|e| DbError::ExecutionError(format!("failed to drop ledger: {e}")))?;
            }
            session
                .conn
                .execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                         applied_at       TIMESTAMP NOT NULL DEFAULT now(),
                         major_release_id BIGINT NOT NULL,
                         minor_release_id BIGINT NOT NULL,
                         patch_id         BIGINT NOT NULL,
                         rows_affected    BIGINT NOT NULL,
                         file_name        VARCHAR NOT NULL,
                         executed_sql     VARCHAR NOT NULL
                     )"
                ))
                .map_err(|e| DbError::ExecutionError(format!("failed to create ledger: {e}")))
        })
    }

    fn lookup(&mut self, identity: PatchIdentity) -> DbResult<Option<NaiveDateTime>> {
        let sql = format!(
            "SELECT CAST(applied_at AS VARCHAR) FROM {}
             WHERE major_release_id = ? AND minor_release_id = ? AND patch_id = ?
             ORDER BY applied_at
             LIMIT 1",
            self.quoted_table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(duckdb::params![
            i64::from(identity.major),
            i64::from(identity.minor),
            i64::from(identity.patch)
        ])?;

        match rows.next()? {
            Some(row) => {
                let applied_at: String = row.get(0)?;
                parse_timestamp(&applied_at).map(Some)
            }
            None => Ok(None),
        }
    }

    fn record(&mut self, entry: &NewLedgerEntry<'_>) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (major_release_id, minor_release_id, patch_id, rows_affected, file_name, executed_sql)
             VALUES (?, ?, ?, ?, ?, ?)",
            self.quoted_table()
        );
        self.conn
            .execute(
                &sql,
                duckdb::params![
                    i64::from(entry.identity.major),
                    i64::from(entry.identity.minor),
                    i64::from(entry.identity.patch),
                    entry.rows_affected,
                    entry.file_name,
                    entry.executed_sql
                ],
            )
            .map_err(|e| {
                DbError::ExecutionError(format!(
                    "failed to record patch {}: {e}",
                    entry.identity
                ))
            })?;
        Ok(())
    }

    fn entries(&mut self) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT CAST(applied_at AS VARCHAR), major_release_id, minor_release_id, patch_id,
                    rows_affected, file_name, executed_sql
             FROM {}
             ORDER BY major_release_id, minor_release_id, patch_id, applied_at",
            self.quoted_table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(applied_at, major, minor, patch, rows_affected, file_name, executed_sql)| {
                    Ok(LedgerEntry {
                        identity: PatchIdentity::new(
                            version_part(major)?,
                            version_part(minor)?,
                            version_part(patch)?,
                        ),
                        applied_at: parse_timestamp(&applied_at)?,
                        rows_affected,
                        file_name,
                        executed_sql,
                    })
                },
            )
            .collect()
    }
}

fn parse_timestamp(value: &str) -> DbResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| DbError::ExecutionError(format!("invalid ledger timestamp '{value}': {e}")))
}

fn version_part(value: i64) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::ExecutionError(format!("ledger version out of range: {value}")))
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;

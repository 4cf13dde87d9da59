//! Capability traits the patch runner depends on.

use crate::error::{DbError, DbResult};
use chrono::NaiveDateTime;
use dbp_core::PatchIdentity;

/// A transactional SQL session.
///
/// At most one transaction is open at a time.
pub trait Session {
    /// Open a transaction.
    fn begin(&mut self) -> DbResult<()>;

    /// Execute one batch, returning the affected row count, or `None` when
    /// the driver has no count to report.
    fn execute(&mut self, sql: &str) -> DbResult<Option<u64>>;

    /// Commit the open transaction.
    fn commit(&mut self) -> DbResult<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> DbResult<()>;
}

/// A ledger row about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry<'a> {
    pub identity: PatchIdentity,
    pub file_name: &'a str,
    pub rows_affected: i64,
    pub executed_sql: &'a str,
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub identity: PatchIdentity,
    pub applied_at: NaiveDateTime,
    pub rows_affected: i64,
    pub file_name: String,
    pub executed_sql: String,
}

/// Durable record of applied patches.
///
/// `lookup` and `record` run inside whatever transaction the session has
/// open; they never begin or commit one themselves.
pub trait Ledger {
    /// Create the ledger table if missing. With `reset`, drop it first.
    fn ensure_table(&mut self, reset: bool) -> DbResult<()>;

    /// When the patch was applied, if it has been.
    fn lookup(&mut self, identity: PatchIdentity) -> DbResult<Option<NaiveDateTime>>;

    /// Append one entry stamped with the current time.
    fn record(&mut self, entry: &NewLedgerEntry<'_>) -> DbResult<()>;

    /// All entries in identity order.
    fn entries(&mut self) -> DbResult<Vec<LedgerEntry>>;
}

/// Run `body` inside a transaction, committing on success and rolling back
/// on error.
///
/// The body's error is returned as-is; a failed rollback is only logged.
pub fn with_transaction<S, F, T, E>(session: &mut S, body: F) -> Result<T, E>
where
    S: Session + ?Sized,
    F: FnOnce(&mut S) -> Result<T, E>,
    E: From<DbError>,
{
    session.begin()?;

    match body(session) {
        Ok(value) => {
            if let Err(commit_err) = session.commit() {
                let _ = session.rollback();
                return Err(commit_err.into());
            }
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback() {
                log::warn!("Rollback failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

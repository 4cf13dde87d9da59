//! dbp-db - Database layer for dbpatch
//!
//! This crate provides the `Session` and `Ledger` capability traits the patch
//! runner is written against, and a DuckDB implementation of both.

pub mod duckdb;
pub mod error;
pub mod statements;
pub mod traits;

pub use crate::duckdb::DuckDbSession;
pub use error::{DbError, DbResult};
pub use traits::{with_transaction, Ledger, LedgerEntry, NewLedgerEntry, Session};

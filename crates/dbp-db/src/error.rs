//! Error types for dbp-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Transaction management error (D003)
    #[error("[D003] Transaction failed: {0}")]
    TransactionError(String),

    /// Unsafe table name (D004)
    #[error("[D004] Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// DuckDB driver error with preserved source chain (D005)
    #[error("[D005] DuckDB error")]
    DuckDb(#[source] duckdb::Error),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::DuckDb(err)
    }
}

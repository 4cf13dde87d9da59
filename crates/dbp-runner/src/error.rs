//! Error types for dbp-runner

use dbp_core::{CoreError, RowCountDirective};
use dbp_db::DbError;
use thiserror::Error;

/// Errors that abort a patch run
#[derive(Error, Debug)]
pub enum RunError {
    /// Naming, markup, directive or config failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Batch execution, ledger or transaction failure
    #[error(transparent)]
    Db(#[from] DbError),

    /// R001: Affected rows fell outside the file's directive bounds
    #[error("[R001] Number of records affected ({actual}) by {file_name} is outside the bounds defined ({directive})")]
    RowCountViolation {
        file_name: String,
        actual: i64,
        directive: RowCountDirective,
    },

    /// R002: Patch directory or file could not be read
    #[error("[R002] Failed to read patch source {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for RunError
pub type RunResult<T> = Result<T, RunError>;

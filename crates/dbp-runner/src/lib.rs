//! dbp-runner - Patch runner for dbpatch
//!
//! Discovers versioned `*.sql` patch files, orders them by version and
//! applies each pending one inside its own transaction, recording it in the
//! ledger only after its row-count directive has been satisfied.

pub mod error;
pub mod runner;
pub mod source;

pub use error::{RunError, RunResult};
pub use runner::{
    check_row_count, PatchOutcome, PatchReport, PatchRunner, PatchState, RunSummary, StatusReport,
};
pub use source::{discover, DirectorySource, PatchFile, PatchSource};

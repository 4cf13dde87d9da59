//! Applies pending patch files in version order, one transaction per file.
//!
//! Each file moves through:
//!
//! ```text
//! Pending -> Checking -> Skipped
//! Pending -> Checking -> Executing -> Validating -> Recorded
//! ```
//!
//! and any error from a non-terminal state is `Failed`, which stops the run.

use crate::error::{RunError, RunResult};
use crate::source::{discover, PatchFile, PatchSource};
use chrono::{Local, NaiveDateTime};
use dbp_core::{prepare_script, PatchIdentity, RowCountDirective, RunConfig};
use dbp_db::{with_transaction, Ledger, LedgerEntry, NewLedgerEntry, Session};
use std::fmt;

/// Lifecycle of one patch file within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    Pending,
    Checking,
    Skipped,
    Executing,
    Validating,
    Recorded,
    Failed,
}

impl fmt::Display for PatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchState::Pending => write!(f, "pending"),
            PatchState::Checking => write!(f, "checking"),
            PatchState::Skipped => write!(f, "skipped"),
            PatchState::Executing => write!(f, "executing"),
            PatchState::Validating => write!(f, "validating"),
            PatchState::Recorded => write!(f, "recorded"),
            PatchState::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal result for a file that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Already in the ledger; nothing executed.
    Skipped { applied_at: NaiveDateTime },
    /// Executed, validated, recorded and committed.
    Recorded { rows_affected: i64 },
}

/// Per-file line of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub identity: PatchIdentity,
    pub file_name: String,
    pub outcome: PatchOutcome,
}

/// Outcome of a successful run, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub patches: Vec<PatchReport>,
}

impl RunSummary {
    pub fn recorded(&self) -> impl Iterator<Item = &PatchReport> {
        self.patches
            .iter()
            .filter(|p| matches!(p.outcome, PatchOutcome::Recorded { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PatchReport> {
        self.patches
            .iter()
            .filter(|p| matches!(p.outcome, PatchOutcome::Skipped { .. }))
    }
}

/// Ledger contents alongside the files not yet applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub applied: Vec<LedgerEntry>,
    pub pending: Vec<PatchFile>,
}

/// Drives discovery, filtering, execution and recording of patch files.
#[derive(Debug, Clone, Default)]
pub struct PatchRunner {
    environment: Option<String>,
    reset: bool,
}

impl PatchRunner {
    pub fn new(environment: Option<String>, reset: bool) -> Self {
        Self { environment, reset }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.environment().map(str::to_string), config.reset())
    }

    /// Apply every pending patch from `source`, stopping at the first error.
    ///
    /// The ledger table is ensured (and dropped first when resetting) once,
    /// before any file is checked.
    pub fn run<P, D>(&self, source: &P, db: &mut D) -> RunResult<RunSummary>
    where
        P: PatchSource + ?Sized,
        D: Session + Ledger + ?Sized,
    {
        log::info!("Starting to process path: {}.", source.describe());
        let patches = discover(source)?;

        db.ensure_table(self.reset)?;

        let mut summary = RunSummary::default();
        if patches.is_empty() {
            log::info!("No files found so doing nothing.");
            return Ok(summary);
        }

        for patch in &patches {
            let report = self.apply_patch(source, db, patch).inspect_err(|e| {
                log::debug!("{}: {} ({e})", patch.file_name, PatchState::Failed);
            })?;
            summary.patches.push(report);
        }

        log::info!("Process finished.");
        Ok(summary)
    }

    /// Run one file through the state machine.
    pub fn apply_patch<P, D>(&self, source: &P, db: &mut D, patch: &PatchFile) -> RunResult<PatchReport>
    where
        P: PatchSource + ?Sized,
        D: Session + Ledger + ?Sized,
    {
        transition(patch, PatchState::Pending);
        log::info!("Checking patch: {}", patch.file_name);

        transition(patch, PatchState::Checking);
        if let Some(applied_at) = db.lookup(patch.identity)? {
            log::info!("  Patch already applied on: {applied_at}");
            transition(patch, PatchState::Skipped);
            return Ok(PatchReport {
                identity: patch.identity,
                file_name: patch.file_name.clone(),
                outcome: PatchOutcome::Skipped { applied_at },
            });
        }

        let text = source.read(&patch.file_name)?;
        let script = prepare_script(&text, self.environment.as_deref())?;
        let terminator = text.line_ending.as_str();

        let rows_affected = with_transaction(db, |db: &mut D| -> RunResult<i64> {
            transition(patch, PatchState::Executing);
            log::info!("Executing Patch: {} on {}", patch.file_name, Local::now());

            let mut rows_affected: i64 = 0;
            let mut executed_sql = String::new();
            for (index, batch) in script.executable_batches().enumerate() {
                let rows = db.execute(batch)?;
                log::debug!(
                    "{} batch {}: {}",
                    patch.file_name,
                    index + 1,
                    rows.map_or_else(|| "no row count".to_string(), |r| format!("{r} rows"))
                );
                if let Some(rows) = rows {
                    rows_affected =
                        rows_affected.saturating_add(i64::try_from(rows).unwrap_or(i64::MAX));
                }
                executed_sql.push_str(batch);
                executed_sql.push_str(terminator);
            }

            transition(patch, PatchState::Validating);
            if let Some(directive) = script.directive {
                check_row_count(&patch.file_name, rows_affected, directive)?;
            }

            db.record(&NewLedgerEntry {
                identity: patch.identity,
                file_name: &patch.file_name,
                rows_affected,
                executed_sql: &executed_sql,
            })?;
            Ok(rows_affected)
        })?;

        transition(patch, PatchState::Recorded);
        log::info!("  {rows_affected} rows affected on {}", Local::now());

        Ok(PatchReport {
            identity: patch.identity,
            file_name: patch.file_name.clone(),
            outcome: PatchOutcome::Recorded { rows_affected },
        })
    }

    /// Ledger entries and the patch files that a run would still apply.
    ///
    /// Ensures the ledger table exists but never drops it and never executes
    /// patch content.
    pub fn status<P, D>(&self, source: &P, db: &mut D) -> RunResult<StatusReport>
    where
        P: PatchSource + ?Sized,
        D: Ledger + ?Sized,
    {
        let patches = discover(source)?;
        db.ensure_table(false)?;

        let mut pending = Vec::new();
        for patch in patches {
            if db.lookup(patch.identity)?.is_none() {
                pending.push(patch);
            }
        }

        Ok(StatusReport {
            applied: db.entries()?,
            pending,
        })
    }
}

/// Fail when `actual` falls outside the directive's bounds.
pub fn check_row_count(file_name: &str, actual: i64, directive: RowCountDirective) -> RunResult<()> {
    if directive.admits(actual) {
        Ok(())
    } else {
        Err(RunError::RowCountViolation {
            file_name: file_name.to_string(),
            actual,
            directive,
        })
    }
}

fn transition(patch: &PatchFile, state: PatchState) {
    log::debug!("{}: {state}", patch.file_name);
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

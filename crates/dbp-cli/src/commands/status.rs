//! Status command implementation

use anyhow::{Context, Result};
use dbp_runner::{PatchRunner, StatusReport};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::resolve_target;

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let target = resolve_target(global, &args.target, false)?;
    let source = target.source();
    let mut db = target.open_session()?;

    let report = PatchRunner::from_config(&target.run)
        .status(&source, &mut db)
        .context("Failed to read patch status")?;

    for line in render(&report) {
        println!("{line}");
    }
    Ok(())
}

/// Human-readable listing of applied and pending patches.
pub(crate) fn render(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![format!("Applied patches ({}):", report.applied.len())];
    for entry in &report.applied {
        lines.push(format!(
            "  {:<12} {}  {:>8} rows  {}",
            entry.identity.to_string(),
            entry.applied_at.format("%Y-%m-%d %H:%M:%S"),
            entry.rows_affected,
            entry.file_name
        ));
    }

    lines.push(format!("Pending patches ({}):", report.pending.len()));
    for patch in &report.pending {
        lines.push(format!(
            "  {:<12} {}",
            patch.identity.to_string(),
            patch.file_name
        ));
    }
    lines
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;

//! Apply command implementation

use anyhow::{Context, Result};
use dbp_runner::{PatchRunner, RunSummary};

use crate::cli::{ApplyArgs, GlobalArgs};
use crate::commands::common::resolve_target;

/// Execute the apply command
pub(crate) fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let target = resolve_target(global, &args.target, args.reset)?;
    if let Some(environment) = target.run.environment() {
        log::info!("Target environment: {environment}");
    }
    if target.run.reset() {
        log::warn!(
            "Resetting ledger {}: every patch will be applied again",
            target.run.ledger_table()
        );
    }

    let source = target.source();
    let mut db = target.open_session()?;

    let summary = PatchRunner::from_config(&target.run)
        .run(&source, &mut db)
        .context("Patch run failed")?;

    println!("{}", summary_line(&summary));
    Ok(())
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "Applied {} patch(es), skipped {} already applied",
        summary.recorded().count(),
        summary.skipped().count()
    )
}

#[cfg(test)]
#[path = "apply_test.rs"]
mod tests;

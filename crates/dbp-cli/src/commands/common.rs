//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dbp_core::{Config, RunConfig};
use dbp_db::DuckDbSession;
use dbp_runner::DirectorySource;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalArgs, TargetArgs};

const MEMORY_DATABASE: &str = ":memory:";

/// Settings for one command after merging dbpatch.yml with CLI flags.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) run: RunConfig,
    pub(crate) database: String,
}

impl Target {
    pub(crate) fn source(&self) -> DirectorySource {
        DirectorySource::new(self.run.patch_dir())
    }

    pub(crate) fn open_session(&self) -> Result<DuckDbSession> {
        DuckDbSession::new(&self.database, &self.run.ledger_table())
            .with_context(|| format!("Failed to open database: {}", self.database))
    }
}

/// Load config, apply CLI overrides and validate, relative to the current
/// working directory.
pub(crate) fn resolve_target(
    global: &GlobalArgs,
    target: &TargetArgs,
    reset: bool,
) -> Result<Target> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    resolve_target_in(&cwd, global, target, reset)
}

pub(crate) fn resolve_target_in(
    cwd: &Path,
    global: &GlobalArgs,
    target: &TargetArgs,
    reset: bool,
) -> Result<Target> {
    let (config, root) = load_config(cwd, global)?;
    let config = apply_overrides(config, &root, cwd, target, reset);

    let run = config
        .resolve(&root)
        .context("Invalid configuration")?;
    run.check_patch_dir()?;

    log::debug!(
        "Patch path: {}, ledger table: {}, database: {}",
        run.patch_dir().display(),
        run.ledger_table(),
        config.database.path
    );

    Ok(Target {
        run,
        database: config.database.path,
    })
}

/// Read `--config` or `./dbpatch.yml`. Returns the config and the directory
/// its relative paths are resolved against.
fn load_config(cwd: &Path, global: &GlobalArgs) -> Result<(Config, PathBuf)> {
    match &global.config {
        Some(path) => {
            let path = cwd.join(path);
            let config = Config::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            let root = path
                .parent()
                .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
            Ok((config, root))
        }
        None => {
            let config = Config::load_or_default(cwd).context("Failed to load dbpatch.yml")?;
            Ok((config, cwd.to_path_buf()))
        }
    }
}

/// CLI flags win over file values. Paths given on the command line are
/// relative to `cwd`; paths from the file stay relative to `root`.
fn apply_overrides(
    mut config: Config,
    root: &Path,
    cwd: &Path,
    target: &TargetArgs,
    reset: bool,
) -> Config {
    config.database.path = match &target.database {
        Some(path) => absolute_database(path, cwd),
        None => absolute_database(&config.database.path, root),
    };
    if let Some(path) = &target.path {
        config.patch_path = cwd.join(path).to_string_lossy().into_owned();
    }
    if let Some(prefix) = &target.table_prefix {
        config.table_prefix = Some(prefix.clone());
    }
    if let Some(environment) = &target.environment {
        config.environment = Some(environment.clone());
    }
    config.reset |= reset;
    config
}

fn absolute_database(path: &str, base: &Path) -> String {
    if path == MEMORY_DATABASE {
        path.to_string()
    } else {
        base.join(path).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;

//! Configuration types and parsing for dbpatch.yml

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::is_identifier_fragment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dbpatch.yml";

/// Prefix of the ledger table name; the configured table prefix is appended.
pub const LEDGER_TABLE_BASE: &str = "schema_change_log";

/// Project configuration from dbpatch.yml
///
/// Every field can be overridden on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing `*.sql` patch files
    #[serde(default = "default_patch_path")]
    pub patch_path: String,

    /// Suffix appended to the ledger table name
    #[serde(default)]
    pub table_prefix: Option<String>,

    /// Target environment for `<environment>` blocks
    #[serde(default)]
    pub environment: Option<String>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Drop the ledger table before applying patches
    #[serde(default)]
    pub reset: bool,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the DuckDB file, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patch_path: default_patch_path(),
            table_prefix: None,
            environment: None,
            database: DatabaseConfig::default(),
            reset: false,
        }
    }
}

fn default_patch_path() -> String {
    "patches".to_string()
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParse {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Load `dbpatch.yml` from `dir`, falling back to defaults when absent.
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve into validated run settings. Relative patch paths are taken
    /// relative to `root`.
    pub fn resolve(&self, root: &Path) -> CoreResult<RunConfig> {
        let table_prefix = self
            .table_prefix
            .clone()
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: "table_prefix is required".to_string(),
            })?;

        let patch_dir = if Path::new(&self.patch_path).is_absolute() {
            PathBuf::from(&self.patch_path)
        } else {
            root.join(&self.patch_path)
        };

        RunConfig::new(patch_dir, table_prefix, self.environment.clone(), self.reset)
    }
}

/// Validated settings consumed by the patch runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    patch_dir: PathBuf,
    table_prefix: String,
    environment: Option<String>,
    reset: bool,
}

impl RunConfig {
    /// Validate and build run settings.
    ///
    /// The table prefix must be ASCII letters, digits and underscores. A
    /// blank environment means filtering is disabled.
    pub fn new(
        patch_dir: PathBuf,
        table_prefix: String,
        environment: Option<String>,
        reset: bool,
    ) -> CoreResult<Self> {
        if !is_identifier_fragment(&table_prefix) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "table_prefix '{table_prefix}' must contain only ASCII letters, digits and underscores"
                ),
            });
        }

        let environment = environment
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        Ok(Self {
            patch_dir,
            table_prefix,
            environment,
            reset,
        })
    }

    pub fn patch_dir(&self) -> &Path {
        &self.patch_dir
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn reset(&self) -> bool {
        self.reset
    }

    /// Name of the ledger table, e.g. `schema_change_log_billing`.
    pub fn ledger_table(&self) -> String {
        format!("{LEDGER_TABLE_BASE}_{}", self.table_prefix)
    }

    /// Fail unless the patch directory exists and is a directory.
    pub fn check_patch_dir(&self) -> CoreResult<()> {
        if self.patch_dir.is_dir() {
            Ok(())
        } else {
            Err(CoreError::ConfigInvalid {
                message: format!(
                    "patch path '{}' does not exist or is not a directory",
                    self.patch_dir.display()
                ),
            })
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! dbp-core - Core library for dbpatch
//!
//! This crate provides patch identity parsing, `<environment>` block
//! filtering, row-count directive and batch splitting, and configuration
//! types shared by the runner and the CLI. It has no database dependency.

pub mod config;
pub mod environment;
pub mod error;
pub mod patch_id;
pub mod script;
pub mod sql_utils;

pub use config::{Config, DatabaseConfig, RunConfig};
pub use environment::{filter_for_environment, FilterMode};
pub use error::{CoreError, CoreResult};
pub use patch_id::PatchIdentity;
pub use script::{prepare_script, LineEnding, PatchText, PreparedScript, RowCountDirective};

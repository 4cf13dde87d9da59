//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// dbpatch - Apply ordered, versioned SQL patch files exactly once
#[derive(Parser, Debug)]
#[command(name = "dbpatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (default: ./dbpatch.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write log output to this file (truncated at start)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Also mirror log output to stderr when --log-file is set
    #[arg(long, global = true, requires = "log_file")]
    pub tee: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every pending patch file in version order
    Apply(ApplyArgs),

    /// List applied and pending patch files without executing anything
    Status(StatusArgs),
}

/// Where patches come from and which ledger they are tracked in
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Directory containing *.sql patch files
    #[arg(short = 'p', long)]
    pub path: Option<PathBuf>,

    /// Suffix of the ledger table (schema_change_log_<prefix>)
    #[arg(long)]
    pub table_prefix: Option<String>,

    /// Target environment for <environment> blocks
    #[arg(short, long)]
    pub environment: Option<String>,

    /// DuckDB database file, or :memory:
    #[arg(short, long)]
    pub database: Option<String>,
}

/// Arguments for the apply command
#[derive(Args, Debug, Clone, Default)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Drop the ledger table first so every patch is applied again
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for the status command
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

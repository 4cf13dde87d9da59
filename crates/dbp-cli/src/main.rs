//! dbpatch CLI - applies versioned SQL patch files exactly once

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod logging;

use cli::Cli;
use commands::{apply, status};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = match logging::init(&cli.global) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("Failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        cli::Commands::Apply(args) => apply::execute(args, &cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
    };

    if let Err(e) = result {
        log::error!("{e:#}");
        return ExitCode::FAILURE;
    }

    if let Some(path) = log_file {
        println!("Log file saved to {}", path.display());
    }
    ExitCode::SUCCESS
}

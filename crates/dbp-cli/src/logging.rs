//! Log sink setup: env_logger to stderr, a file, or both.

use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Install the global logger. Returns the log file path when one is in use.
///
/// The level is `info` (or `debug` with `--verbose`); `RUST_LOG` overrides it.
pub(crate) fn init(global: &GlobalArgs) -> Result<Option<PathBuf>> {
    let level = if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .format_module_path(false)
        .format_target(false);

    if let Some(path) = &global.log_file {
        let file = open_log_file(path)?;
        let sink: Box<dyn Write + Send> = if global.tee {
            Box::new(TeeWriter {
                file,
                stderr: io::stderr(),
            })
        } else {
            Box::new(file)
        };
        builder.target(Target::Pipe(sink)).write_style(WriteStyle::Never);
    }

    builder.try_init().context("Failed to install logger")?;
    Ok(global.log_file.clone())
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to create log file: {}", path.display()))
}

/// Writes every record to the log file and to stderr.
struct TeeWriter {
    file: File,
    stderr: io::Stderr,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.stderr.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.stderr.flush()
    }
}

#[cfg(test)]
#[path = "logging_test.rs"]
mod tests;

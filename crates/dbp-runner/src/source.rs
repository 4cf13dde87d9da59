//! Patch file discovery.

use crate::error::{RunError, RunResult};
use dbp_core::{PatchIdentity, PatchText};
use std::path::{Path, PathBuf};

/// Where patch files come from.
pub trait PatchSource {
    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;

    /// Names of all candidate patch files, in any order.
    fn list(&self) -> RunResult<Vec<String>>;

    /// Read one file by name.
    fn read(&self, file_name: &str) -> RunResult<PatchText>;
}

/// `*.sql` files directly inside one directory (no recursion).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn source_error(path: &Path, source: std::io::Error) -> RunError {
        RunError::Source {
            path: path.display().to_string(),
            source,
        }
    }
}

impl PatchSource for DirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn list(&self) -> RunResult<Vec<String>> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| Self::source_error(&self.dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::source_error(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() || !path.extension().is_some_and(|e| e.eq_ignore_ascii_case("sql")) {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => names.push(name.to_string()),
                None => log::warn!("Skipping patch file with non UTF-8 name: {}", path.display()),
            }
        }
        Ok(names)
    }

    fn read(&self, file_name: &str) -> RunResult<PatchText> {
        let path = self.dir.join(file_name);
        let content =
            std::fs::read_to_string(&path).map_err(|e| Self::source_error(&path, e))?;
        Ok(PatchText::from_content(&content))
    }
}

/// A discovered patch file and its ordering key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PatchFile {
    pub identity: PatchIdentity,
    pub file_name: String,
}

/// List `source` and return its files in ascending identity order.
///
/// Any file whose name does not parse is a fatal error. Duplicate identities
/// are logged but not rejected; their relative order falls back to file name.
pub fn discover<P>(source: &P) -> RunResult<Vec<PatchFile>>
where
    P: PatchSource + ?Sized,
{
    let mut patches = source
        .list()?
        .into_iter()
        .map(|file_name| {
            Ok(PatchFile {
                identity: PatchIdentity::from_file_name(&file_name)?,
                file_name,
            })
        })
        .collect::<RunResult<Vec<_>>>()?;

    patches.sort();

    for pair in patches.windows(2) {
        if pair[0].identity == pair[1].identity {
            log::warn!(
                "Patches {} and {} share version {}",
                pair[0].file_name,
                pair[1].file_name,
                pair[0].identity
            );
        }
    }

    Ok(patches)
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;

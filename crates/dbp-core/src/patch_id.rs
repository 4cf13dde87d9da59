//! Version identity parsed from a patch file name.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `(major, minor, patch)` triple that orders patch files.
///
/// Field order matters: the derived `Ord` compares major, then minor, then
/// patch, each numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatchIdentity {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PatchIdentity {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the identity from a file name of the form `X.Y.Z.<anything>.sql`.
    ///
    /// Only the first three dot-separated segments are inspected. A missing
    /// or non-numeric segment is a naming-convention error naming the
    /// segment that failed.
    pub fn from_file_name(file_name: &str) -> CoreResult<Self> {
        let segments: Vec<&str> = file_name.split('.').collect();
        Ok(Self {
            major: segment(file_name, &segments, 0, "Major")?,
            minor: segment(file_name, &segments, 1, "Minor")?,
            patch: segment(file_name, &segments, 2, "Patch")?,
        })
    }
}

fn segment(file_name: &str, segments: &[&str], position: usize, name: &str) -> CoreResult<u32> {
    segments
        .get(position)
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| CoreError::NamingConvention {
            file_name: file_name.to_string(),
            segment: name.to_string(),
        })
}

impl fmt::Display for PatchIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
#[path = "patch_id_test.rs"]
mod tests;

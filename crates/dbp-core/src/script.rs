//! Patch script preparation: row-count directive extraction and batch
//! splitting on the `GO` separator.

use crate::environment::filter_for_environment;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword that ends one batch and starts the next.
pub const BATCH_SEPARATOR: &str = "GO";

/// Line terminator detected in a patch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// CRLF if `content` contains any `\r\n`, LF otherwise.
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// The raw contents of one patch file, as lines without terminators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchText {
    pub lines: Vec<String>,
    pub line_ending: LineEnding,
}

impl PatchText {
    /// Split file content into lines, dropping a leading UTF-8 byte order mark.
    pub fn from_content(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        Self {
            lines: content.lines().map(str::to_string).collect(),
            line_ending: LineEnding::detect(content),
        }
    }
}

/// Optional row-count bounds declared on the first line of a patch file.
///
/// ```text
/// -- {"minRecords": 1, "maxRecords": 10}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowCountDirective {
    #[serde(default, alias = "MinRecords", alias = "minrecords")]
    pub min_records: Option<i64>,
    #[serde(default, alias = "MaxRecords", alias = "maxrecords")]
    pub max_records: Option<i64>,
}

impl RowCountDirective {
    /// Whether `rows` satisfies both bounds.
    pub fn admits(&self, rows: i64) -> bool {
        self.max_records.is_none_or(|max| rows <= max)
            && self.min_records.is_none_or(|min| rows >= min)
    }
}

impl fmt::Display for RowCountDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<i64>| b.map_or_else(|| "none".to_string(), |v| v.to_string());
        write!(
            f,
            "min {} / max {}",
            bound(self.min_records),
            bound(self.max_records)
        )
    }
}

/// Directive and batches ready for execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreparedScript {
    pub directive: Option<RowCountDirective>,
    /// Always at least one element; empty batches are kept and skipped at
    /// execution time.
    pub batches: Vec<String>,
}

impl PreparedScript {
    /// Batches that contain something other than whitespace.
    pub fn executable_batches(&self) -> impl Iterator<Item = &str> {
        self.batches
            .iter()
            .map(String::as_str)
            .filter(|b| !b.trim().is_empty())
    }
}

/// Decode a directive line, returning `Ok(None)` when the line is not a
/// directive at all.
///
/// The line may be prefixed with `--` or `-- ` and must start with `{` and
/// end with `}` once the prefix is stripped.
pub fn parse_directive(line: &str) -> CoreResult<Option<RowCountDirective>> {
    let trimmed = line.trim();
    let body = trimmed.strip_prefix("--").map_or(trimmed, str::trim_start);
    if !(body.starts_with('{') && body.ends_with('}')) {
        return Ok(None);
    }

    let directive: RowCountDirective =
        serde_json::from_str(body).map_err(|e| CoreError::DirectiveDecode {
            message: format!("{e}: {body}"),
        })?;

    if directive.min_records.is_none() && directive.max_records.is_none() {
        return Err(CoreError::DirectiveDecode {
            message: "MinRecords and/or MaxRecords not specified.".to_string(),
        });
    }

    Ok(Some(directive))
}

/// Whether `line` starts a new batch.
pub fn is_batch_separator(line: &str) -> bool {
    line.trim_start()
        .get(..BATCH_SEPARATOR.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(BATCH_SEPARATOR))
}

/// Split lines into batches on separator lines. Separator lines themselves
/// are dropped and the trailing batch is always emitted.
pub fn split_batches(lines: &[String], line_ending: LineEnding) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();

    for line in lines {
        if is_batch_separator(line) {
            batches.push(std::mem::take(&mut current));
            continue;
        }
        current.push_str(line);
        current.push_str(line_ending.as_str());
    }
    batches.push(current);

    batches
}

/// Extract the directive, apply environment filtering and split into batches.
pub fn prepare_script(text: &PatchText, environment: Option<&str>) -> CoreResult<PreparedScript> {
    let (directive, body) = match text.lines.split_first() {
        Some((first, rest)) => match parse_directive(first)? {
            Some(directive) => (Some(directive), rest),
            None => (None, text.lines.as_slice()),
        },
        None => (None, text.lines.as_slice()),
    };

    let filtered = filter_for_environment(body, environment)?;

    Ok(PreparedScript {
        directive,
        batches: split_batches(&filtered, text.line_ending),
    })
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;

//! Environment-conditional line filtering.
//!
//! A patch file may embed an `<environment>` block whose children are named
//! after deployment targets:
//!
//! ```text
//! <environment>
//! <dev>
//! INSERT INTO settings VALUES ('debug', 'on');
//! </dev>
//! <prod>
//! INSERT INTO settings VALUES ('debug', 'off');
//! </prod>
//! </environment>
//! ```
//!
//! Filtering has two modes. When no target environment is configured, or no
//! line is exactly `<environment>` (ASCII case-insensitive), the lines pass
//! through untouched. Otherwise the whole file is parsed as strict XML and only
//! the text of the children named after the target survives.

use crate::error::{CoreError, CoreResult};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Line that switches a file into strict markup parsing.
pub const ENVIRONMENT_TAG: &str = "<environment>";

/// Name of the required root element.
pub const ENVIRONMENT_ROOT: &str = "environment";

/// Terminator used to join lines before parsing and to split matched text.
const MARKUP_LINE_ENDING: &str = "\r\n";

/// How a file's lines are treated by [`filter_for_environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Lines are returned unchanged.
    PassThrough,
    /// Lines are parsed as an `<environment>` document.
    Strict,
}

impl FilterMode {
    /// Decide which mode applies to `lines` for the given target.
    pub fn detect(lines: &[String], environment: Option<&str>) -> Self {
        let has_target = environment.is_some_and(|e| !e.is_empty());
        if lines.is_empty() || !has_target {
            return FilterMode::PassThrough;
        }
        if lines.iter().any(|l| l.eq_ignore_ascii_case(ENVIRONMENT_TAG)) {
            FilterMode::Strict
        } else {
            FilterMode::PassThrough
        }
    }
}

/// One direct child of the `<environment>` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentBlock {
    pub name: String,
    /// Concatenated, unescaped text content.
    pub text: String,
    /// True when the child held an element, comment, CDATA section or
    /// processing instruction instead of plain text.
    pub nested: bool,
}

/// Parse result of an `<environment>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDocument {
    pub root: String,
    pub blocks: Vec<EnvironmentBlock>,
}

impl EnvironmentDocument {
    /// Parse `body` as a single-rooted XML document, one level of children deep.
    ///
    /// Only well-formedness is checked here; root naming and nesting rules
    /// are enforced by [`select_environment_lines`].
    pub fn parse(body: &str) -> CoreResult<Self> {
        let mut reader = Reader::from_str(body);
        let mut stack: Vec<String> = Vec::new();
        let mut root: Option<String> = None;
        let mut blocks: Vec<EnvironmentBlock> = Vec::new();
        let mut current: Option<EnvironmentBlock> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                markup_error(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Eof => break,
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let is_empty = matches!(event, Event::Empty(_));
                    match stack.len() {
                        0 => {
                            if let Some(existing) = &root {
                                return Err(markup_error(format!(
                                    "multiple root elements: '{existing}' and '{name}'"
                                )));
                            }
                            root = Some(name.clone());
                        }
                        1 => {
                            let block = EnvironmentBlock {
                                name: name.clone(),
                                text: String::new(),
                                nested: false,
                            };
                            if is_empty {
                                blocks.push(block);
                            } else {
                                current = Some(block);
                            }
                        }
                        _ => mark_nested(&mut current),
                    }
                    if !is_empty {
                        stack.push(name);
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match stack.pop() {
                        Some(open) if open == name => {}
                        Some(open) => {
                            return Err(markup_error(format!(
                                "end tag '{name}' does not match start tag '{open}'"
                            )));
                        }
                        None => {
                            return Err(markup_error(format!("unexpected end tag '{name}'")));
                        }
                    }
                    if stack.len() == 1 {
                        if let Some(block) = current.take() {
                            blocks.push(block);
                        }
                    }
                }
                Event::Text(ref e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| markup_error(err.to_string()))?;
                    match stack.len() {
                        0 if !text.trim().is_empty() => {
                            return Err(markup_error(format!(
                                "text outside the root element: '{}'",
                                text.trim()
                            )));
                        }
                        2 => {
                            if let Some(block) = current.as_mut() {
                                block.text.push_str(&text);
                            }
                        }
                        _ => {}
                    }
                }
                Event::CData(_) | Event::Comment(_) | Event::PI(_) => {
                    if stack.len() >= 2 {
                        mark_nested(&mut current);
                    }
                }
                Event::Decl(_) | Event::DocType(_) => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(markup_error(format!("element '{open}' is never closed")));
        }
        let root = root.ok_or_else(|| markup_error("document has no root element".into()))?;

        Ok(Self { root, blocks })
    }
}

fn mark_nested(current: &mut Option<EnvironmentBlock>) {
    if let Some(block) = current.as_mut() {
        block.nested = true;
    }
}

fn markup_error(message: String) -> CoreError {
    CoreError::MarkupSyntax { message }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Filter `lines` down to those that apply to `environment`.
///
/// Pass-through mode returns the input unchanged. Strict mode returns only the
/// matched blocks' lines, or nothing at all when no block matches.
pub fn filter_for_environment(
    lines: &[String],
    environment: Option<&str>,
) -> CoreResult<Vec<String>> {
    match (FilterMode::detect(lines, environment), environment) {
        (FilterMode::Strict, Some(target)) => select_environment_lines(lines, target),
        _ => Ok(lines.to_vec()),
    }
}

/// Strict-mode filtering: parse `lines` as an `<environment>` document and
/// return the lines of every child named `target` (case-insensitive), in
/// document order.
pub fn select_environment_lines(lines: &[String], target: &str) -> CoreResult<Vec<String>> {
    let body = lines.join(MARKUP_LINE_ENDING);
    let document = EnvironmentDocument::parse(&body).inspect_err(|_| {
        log::warn!(
            "You are using the magic string '{ENVIRONMENT_TAG}'. This can only be used with xml parsing and environment checks"
        );
    })?;

    if !eq_ignore_case(&document.root, ENVIRONMENT_ROOT) {
        return Err(CoreError::RootNodeMissing {
            found: document.root,
        });
    }

    let mut filtered = Vec::new();
    for block in &document.blocks {
        if block.nested {
            return Err(CoreError::NestedNode {
                node: block.name.clone(),
            });
        }
        if eq_ignore_case(&block.name, target) {
            filtered.extend(trim_block_lines(&block.text));
        }
    }

    Ok(filtered)
}

/// Split block text into lines, dropping the blank first and last lines left
/// behind when tags sit on their own lines.
fn trim_block_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<&str> = text.split(MARKUP_LINE_ENDING).collect();
    if lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
#[path = "environment_test.rs"]
mod tests;

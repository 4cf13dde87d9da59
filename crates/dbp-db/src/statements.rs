//! Split a batch into individual statements so each one's row count can be
//! read from the driver.

use sqlparser::dialect::DuckDbDialect;
use sqlparser::tokenizer::{Location, Token, Tokenizer};

/// Split `sql` on top-level semicolons.
///
/// Each returned slice is the original text of one statement, including its
/// terminating semicolon. Pieces holding only whitespace and comments are
/// dropped. If the batch cannot be tokenized it is returned whole so the
/// driver reports the error.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let dialect = DuckDbDialect {};
    let tokens = match Tokenizer::new(&dialect, sql)
        .with_unescape(false)
        .tokenize_with_location()
    {
        Ok(tokens) => tokens,
        Err(e) => {
            log::debug!("Could not tokenize batch, executing it whole: {e}");
            return if has_content(sql) { vec![sql] } else { Vec::new() };
        }
    };

    let line_starts = line_starts(sql);
    let mut statements = Vec::new();
    let mut start = 0;
    let mut content = false;

    for token in &tokens {
        match token.token {
            Token::SemiColon => {
                let Some(offset) = byte_offset(sql, &line_starts, token.span.start) else {
                    return vec![sql];
                };
                let end = offset + 1;
                if content {
                    statements.push(&sql[start..end]);
                }
                start = end;
                content = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => content = true,
        }
    }

    if content {
        statements.push(&sql[start..]);
    }

    statements
}

fn has_content(sql: &str) -> bool {
    sql.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

fn line_starts(sql: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Convert a 1-based line/column location into a byte offset.
fn byte_offset(sql: &str, line_starts: &[usize], location: Location) -> Option<usize> {
    let line = usize::try_from(location.line).ok()?.checked_sub(1)?;
    let column = usize::try_from(location.column).ok()?.checked_sub(1)?;
    let line_start = *line_starts.get(line)?;
    sql[line_start..]
        .char_indices()
        .nth(column)
        .map(|(i, _)| line_start + i)
}

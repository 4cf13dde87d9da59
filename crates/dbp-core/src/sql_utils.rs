//! SQL identifier utilities for dynamically named ledger tables.

/// Quote a SQL identifier, doubling any embedded double quotes.
///
/// # Examples
/// ```
/// use dbp_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("schema_change_log_app"), r#""schema_change_log_app""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Whether `value` is a safe identifier fragment: non-empty ASCII letters,
/// digits and underscores only.
///
/// # Examples
/// ```
/// use dbp_core::sql_utils::is_identifier_fragment;
/// assert!(is_identifier_fragment("billing_v2"));
/// assert!(!is_identifier_fragment("x'; DROP TABLE y; --"));
/// ```
pub fn is_identifier_fragment(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

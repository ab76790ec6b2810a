//! Small SQL text helpers shared by the schema, configuration, and builder.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern compiles")
    })
}

fn table_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
            .expect("table pattern compiles")
    })
}

fn charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("charset pattern compiles"))
}

pub fn is_identifier(value: &str) -> bool {
    identifier_pattern().is_match(value)
}

/// Column names, including the record-id column.
pub(crate) fn ensure_column_name(what: &str, value: &str) -> Result<()> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{what} '{value}' is not a plain SQL identifier"
        )))
    }
}

/// Table names; a single `database.table` qualifier is accepted.
pub(crate) fn ensure_table_name(what: &str, value: &str) -> Result<()> {
    if table_pattern().is_match(value) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{what} '{value}' is not a valid table name"
        )))
    }
}

pub(crate) fn ensure_charset(what: &str, value: &str) -> Result<()> {
    if charset_pattern().is_match(value) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{what} '{value}' is not a MySQL character set name"
        )))
    }
}

/// Renders `value` as a single-quoted MySQL string literal.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_reject_spaces_and_quotes() {
        assert!(is_identifier("productId"));
        assert!(is_identifier("_tmp$1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("product id"));
        assert!(!is_identifier("name`"));
    }

    #[test]
    fn qualified_table_names_are_accepted() {
        assert!(ensure_table_name("target table", "shop.Product").is_ok());
        assert!(ensure_table_name("target table", "shop.Product.x").is_err());
    }

    #[test]
    fn string_literal_escapes_control_characters() {
        assert_eq!(string_literal(","), "','");
        assert_eq!(string_literal("\""), "'\"'");
        assert_eq!(string_literal("\r\n"), r"'\r\n'");
        assert_eq!(string_literal(""), "''");
        assert_eq!(string_literal("it's"), r"'it\'s'");
        assert_eq!(string_literal(r"C:\data"), r"'C:\\data'");
    }
}

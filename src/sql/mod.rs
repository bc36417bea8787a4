//! SQL text construction by literal embedding.
//!
//! Every identifier and value that ends up inside generated SQL passes through
//! this module. Identifiers only ever come from catalog introspection, so they
//! are wrapped in double quotes without internal escaping.

use crate::models::query::{hex, CellValue};

pub mod browse;
pub mod update;

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Single-quoted string literal with embedded quotes doubled.
pub fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Value literal for SET clauses and equality predicates.
///
/// Numbers are embedded as quoted text and left to column affinity. Booleans
/// are stored as 0/1; blobs use SQLite's hex literal form.
pub fn literal(value: &CellValue) -> String {
    match value {
        CellValue::Null => "NULL".to_string(),
        CellValue::Integer(n) => quote_text(&n.to_string()),
        CellValue::Real(v) => quote_text(&v.to_string()),
        CellValue::Text(s) => quote_text(s),
        CellValue::Boolean(b) => quote_text(if *b { "1" } else { "0" }),
        CellValue::Blob(bytes) => format!("X'{}'", hex(bytes)),
    }
}

/// `"col" = <literal>`, or `"col" IS NULL` when the value is null.
pub fn match_predicate(column: &str, value: &CellValue) -> String {
    match value {
        CellValue::Null => format!("{} IS NULL", quote_ident(column)),
        other => format!("{} = {}", quote_ident(column), literal(other)),
    }
}

/// Escapes a search term for use inside a quoted `LIKE` pattern with
/// `ESCAPE '\'`. Backslash goes first so the wildcard escapes survive.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('\'', "''")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `"col" LIKE '%<pattern>%' ESCAPE '\'` for an already escaped pattern.
pub fn contains_predicate(column: &str, escaped: &str) -> String {
    format!("{} LIKE '%{}%' ESCAPE '\\'", quote_ident(column), escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_text_doubles_quotes() {
        assert_eq!(quote_text("O'Brien"), "'O''Brien'");
        assert_eq!(quote_text(""), "''");
    }

    #[test]
    fn test_literal_per_kind() {
        assert_eq!(literal(&CellValue::Null), "NULL");
        assert_eq!(literal(&CellValue::Integer(1)), "'1'");
        assert_eq!(literal(&CellValue::Real(1.5)), "'1.5'");
        assert_eq!(literal(&CellValue::Text("a'b".into())), "'a''b'");
        assert_eq!(literal(&CellValue::Boolean(true)), "'1'");
        assert_eq!(literal(&CellValue::Boolean(false)), "'0'");
        assert_eq!(literal(&CellValue::Blob(vec![0xde, 0xad])), "X'DEAD'");
    }

    #[test]
    fn test_literal_leaves_backslash_alone() {
        assert_eq!(literal(&CellValue::Text("C:\\tmp".into())), "'C:\\tmp'");
    }

    #[test]
    fn test_match_predicate() {
        assert_eq!(match_predicate("id", &CellValue::Integer(1)), "\"id\" = '1'");
        assert_eq!(match_predicate("note", &CellValue::Null), "\"note\" IS NULL");
    }

    #[test]
    fn test_escape_like_order() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\%"), "a\\\\\\%");
        assert_eq!(escape_like("it's"), "it''s");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_contains_predicate() {
        assert_eq!(
            contains_predicate("sku", "50\\%\\_off"),
            "\"sku\" LIKE '%50\\%\\_off%' ESCAPE '\\'"
        );
    }
}

//! Inline value rendering for the text protocol.
//!
//! Admin tables live in SQLite behind the MySQL front end, so string literals
//! follow SQLite quoting: single quotes doubled, backslashes literal.

use pxr_reconcile::Statement;
use pxr_schemas::FieldValue;

fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn literal(v: &FieldValue) -> String {
    match v {
        FieldValue::Null => "NULL".to_string(),
        FieldValue::Bool(true) => "1".to_string(),
        FieldValue::Bool(false) => "0".to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Text(s) => quote_text(s),
    }
}

/// `stmt.sql()` with each `?` replaced by its parameter, in order.
///
/// Placeholders only ever appear where [`Statement::sql`] put them: table and
/// column names are static identifiers and admin commands carry no values.
pub fn render_literal(stmt: &Statement) -> String {
    let sql = stmt.sql();
    let mut params = stmt.params().into_iter();
    let mut out = String::with_capacity(sql.len() + 32);
    for ch in sql.chars() {
        if ch != '?' {
            out.push(ch);
            continue;
        }
        match params.next() {
            Some(v) => out.push_str(&literal(v)),
            None => out.push('?'),
        }
    }
    out
}

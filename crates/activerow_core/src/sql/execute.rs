//! Named-parameter binding and statement execution.
//!
//! # Responsibility
//! - Discover `:name` bind tokens in generated SQL text.
//! - Bind each token from a merged parameter map and run the statement.
//! - Materialize result rows into `Record`s.
//!
//! # Invariants
//! - A token with no value in the map is bound as `NULL`.
//! - Tokens the statement does not expose as parameters (e.g. inside string
//!   literals) are skipped.
//! - Prepared handles come from the connection's statement cache.

use crate::model::record::Record;
use crate::model::value::{FieldMap, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, Statement};

/// Bind marker followed by an identifier.
static BIND_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid bind token regex"));

static NULL_VALUE: FieldValue = FieldValue::Null;

/// Returns the distinct bind tokens of `sql` in first-seen order.
pub fn bind_tokens(sql: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for captures in BIND_TOKEN_RE.captures_iter(sql) {
        if let Some(token) = captures.get(1).map(|m| m.as_str()) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

/// Runs a row-returning statement and collects its rows.
pub fn query_records(
    conn: &Connection,
    sql: &str,
    params: &FieldMap,
    key_field: &str,
) -> rusqlite::Result<Vec<Record>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    bind_named(&mut stmt, sql, params)?;

    let mut rows = stmt.raw_query();
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::new(key_field);
        for (index, column) in columns.iter().enumerate() {
            record.set(column, row.get::<_, FieldValue>(index)?);
        }
        records.push(record);
    }

    Ok(records)
}

/// Runs a data-modifying statement and returns the affected row count.
pub fn execute_statement(conn: &Connection, sql: &str, params: &FieldMap) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(sql)?;
    bind_named(&mut stmt, sql, params)?;
    stmt.raw_execute()
}

fn bind_named(stmt: &mut Statement<'_>, sql: &str, params: &FieldMap) -> rusqlite::Result<()> {
    for token in bind_tokens(sql) {
        let Some(index) = stmt.parameter_index(&format!(":{token}"))? else {
            continue;
        };
        let value = params.get(token).unwrap_or(&NULL_VALUE);
        stmt.raw_bind_parameter(index, value)?;
    }
    Ok(())
}

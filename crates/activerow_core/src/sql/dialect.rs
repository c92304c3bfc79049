//! Pagination dialects for ranged reads.
//!
//! # Responsibility
//! - Render `read_range` SQL for each supported pagination syntax.
//! - Detect a usable dialect with one probe per connection.
//!
//! # Invariants
//! - Every dialect projects exactly the requested columns.
//! - `start`/`limit` select the zero-based window `[start, start + limit)`.
//! - Detection order is fixed: offset/limit, first/skip, row numbering.

use log::{debug, info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Pagination syntax understood by the connected engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `LIMIT <start>, <limit>` (MySQL, SQLite).
    OffsetLimit,
    /// `SELECT FIRST <limit> SKIP <start>` (Firebird/InterBase).
    FirstSkip,
    /// `ROW_NUMBER() OVER (...)` window filtering (older MSSQL).
    RowNumber,
}

impl Dialect {
    /// Detection order.
    pub const ALL: [Dialect; 3] = [Self::OffsetLimit, Self::FirstSkip, Self::RowNumber];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffsetLimit => "offset_limit",
            Self::FirstSkip => "first_skip",
            Self::RowNumber => "row_number",
        }
    }

    /// Returns the first dialect whose probe statement prepares.
    ///
    /// Intermediate prepare failures are expected and only logged. A probe
    /// that prepares but behaves differently on the engine is not caught.
    pub fn detect(conn: &Connection) -> Option<Self> {
        for dialect in Self::ALL {
            match conn.prepare(dialect.probe_sql()) {
                Ok(_) => {
                    info!(
                        "event=dialect_detect module=sql status=ok dialect={}",
                        dialect.as_str()
                    );
                    return Some(dialect);
                }
                Err(err) => debug!(
                    "event=dialect_detect module=sql status=skip dialect={} error={}",
                    dialect.as_str(),
                    err
                ),
            }
        }
        warn!("event=dialect_detect module=sql status=error reason=no_dialect_prepared");
        None
    }

    /// Renders a paginated select over `columns`.
    pub fn range_sql(
        self,
        columns: &str,
        table: &str,
        where_clause: &str,
        order: &str,
        start: u32,
        limit: u32,
    ) -> String {
        match self {
            Self::OffsetLimit => format!(
                "SELECT {columns} FROM {table} WHERE {where_clause} ORDER BY {order} LIMIT {start}, {limit}"
            ),
            Self::FirstSkip => format!(
                "SELECT FIRST {limit} SKIP {start} {columns} FROM {table} WHERE {where_clause} ORDER BY {order}"
            ),
            Self::RowNumber => {
                let end = u64::from(start) + u64::from(limit);
                format!(
                    "SELECT {columns} FROM (SELECT ROW_NUMBER() OVER (ORDER BY {order}) AS row_num, {columns} FROM {table} WHERE {where_clause}) AS paged WHERE row_num > {start} AND row_num <= {end} ORDER BY row_num"
                )
            }
        }
    }

    fn probe_sql(self) -> &'static str {
        match self {
            Self::OffsetLimit => "SELECT 1 AS probe ORDER BY 1 LIMIT 0, 1",
            Self::FirstSkip => "SELECT FIRST 1 SKIP 0 1 AS probe",
            Self::RowNumber => {
                "SELECT probe FROM (SELECT ROW_NUMBER() OVER (ORDER BY 1) AS row_num, 1 AS probe) AS paged WHERE row_num > 0"
            }
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Dialect;
    use rusqlite::Connection;

    #[test]
    fn sqlite_detects_offset_limit() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(Dialect::detect(&conn), Some(Dialect::OffsetLimit));
    }

    #[test]
    fn sqlite_rejects_first_skip_and_accepts_row_number_probe() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(conn.prepare(Dialect::FirstSkip.probe_sql()).is_err());
        assert!(conn.prepare(Dialect::RowNumber.probe_sql()).is_ok());
    }

    #[test]
    fn first_skip_places_window_before_columns() {
        let sql = Dialect::FirstSkip.range_sql("`id`", "`t`", "1=1", "`id` ASC", 4, 2);
        assert_eq!(
            sql,
            "SELECT FIRST 2 SKIP 4 `id` FROM `t` WHERE 1=1 ORDER BY `id` ASC"
        );
    }

    #[test]
    fn row_number_window_is_zero_based_half_open() {
        let sql = Dialect::RowNumber.range_sql("`id`", "`t`", "1=1", "`id` ASC", 3, 5);
        assert!(sql.contains("row_num > 3 AND row_num <= 8"));
        assert!(sql.starts_with("SELECT `id` FROM (SELECT ROW_NUMBER() OVER (ORDER BY `id` ASC)"));
    }

    #[test]
    fn serde_names_are_snake_case() {
        let dialect: Dialect = serde_json::from_str(r#""row_number""#).unwrap();
        assert_eq!(dialect, Dialect::RowNumber);
        assert_eq!(Dialect::OffsetLimit.to_string(), "offset_limit");
    }
}

//! Active-record entities bound to one table.
//!
//! # Responsibility
//! - Define the entity configuration, orchestration core and provider.
//! - Own the domain error type surfaced by every entity operation.
//!
//! # Invariants
//! - Read-only entities never run create/update/delete statements.
//! - Every write runs in exactly one transaction that is rolled back on
//!   driver failure before the error is returned.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod config;
pub mod active;
pub mod provider;

pub type EntityResult<T> = Result<T, EntityError>;

/// Entity-level error.
#[derive(Debug)]
pub enum EntityError {
    /// Missing table, write on a read-only entity or invalid configuration.
    Configuration(String),
    /// A positioned record was required but the cursor is not on a row.
    Position,
    /// Write failed inside its transaction; the transaction was rolled back.
    Persistence {
        operation: &'static str,
        source: rusqlite::Error,
    },
    /// Read of a field that is neither the key nor whitelisted.
    Lookup(String),
    /// No pagination dialect could be prepared on the connection.
    Dialect(String),
    Db(DbError),
}

impl Display for EntityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "entity configuration error: {message}"),
            Self::Position => write!(f, "no record positioned"),
            Self::Persistence { operation, source } => {
                write!(f, "{operation} failed and was rolled back: {source}")
            }
            Self::Lookup(field) => write!(f, "field {field} not found"),
            Self::Dialect(message) => write!(f, "no usable pagination dialect: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Configuration(_) | Self::Position | Self::Lookup(_) | Self::Dialect(_) => None,
        }
    }
}

impl From<DbError> for EntityError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for EntityError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

//! Active-record engine over SQLite.
//!
//! An `Entity` binds one table, generates its CRUD statements, and exposes a
//! cursor over fetched rows so callers can navigate, edit and persist records
//! without writing SQL.

pub mod db;
pub mod entity;
pub mod event;
pub mod logging;
pub mod model;
pub mod sql;

pub use entity::active::Entity;
pub use entity::config::EntityConfig;
pub use entity::provider::{EntityDefinition, EntityProvider};
pub use entity::{EntityError, EntityResult};
pub use event::{EntityEvent, EventBus, EventKind, ListenerId};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingConfig};
pub use model::record::Record;
pub use model::record_set::RecordSet;
pub use model::value::{FieldMap, FieldValue};
pub use sql::dialect::Dialect;
pub use sql::options::FindOptions;
pub use sql::statements::{QueryShape, StatementCache, StatementKind, StatementSet};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

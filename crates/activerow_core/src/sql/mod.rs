//! SQL generation and execution for entity tables.
//!
//! # Responsibility
//! - Generate CRUD statements for an entity configuration and query shape.
//! - Select the pagination dialect for ranged reads.
//! - Bind `:name` parameters and run statements against SQLite.
//!
//! # Invariants
//! - Statement text is rebuilt only when the query shape signature changes.
//! - Driver errors are returned unchanged; mapping to domain errors happens
//!   in the entity layer.

pub mod dialect;
pub mod execute;
pub mod options;
pub mod statements;

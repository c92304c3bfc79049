//! Row-level data model shared by the SQL and entity layers.
//!
//! # Responsibility
//! - Define scalar values, single-row records and the cursor-backed record set.
//!
//! # Invariants
//! - Every `Record` carries its key field, possibly with an empty value.
//! - A `RecordSet` never reports a position while it holds no fetch result.

pub mod record;
pub mod record_set;
pub mod value;

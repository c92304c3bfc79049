//! Caller-facing find options.

use crate::model::value::{FieldMap, FieldValue};

/// Shape of one `find` call.
///
/// `where_clause` and `order` are raw SQL fragments inlined into the
/// generated statement; values should be passed through `params` and
/// referenced as `:name` placeholders instead of being spliced in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Predicate fragment. `Some("")` makes `find` a no-op.
    pub where_clause: Option<String>,
    /// Ordering fragment. Defaults to `<key> ASC` when absent or blank.
    pub order: Option<String>,
    /// Zero-based offset of the first row; only used when `limit > 0`.
    pub start: u32,
    /// Page size. `0` disables paging.
    pub limit: u32,
    /// Extra values for `:name` placeholders used in the fragments.
    pub params: FieldMap,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn range(mut self, start: u32, limit: u32) -> Self {
        self.start = start;
        self.limit = limit;
        self
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns `true` when the ranged statement must be used.
    pub fn is_paged(&self) -> bool {
        self.limit > 0
    }

    /// Returns `true` when a `where` was given but is blank.
    pub(crate) fn has_blank_where(&self) -> bool {
        self.where_clause
            .as_deref()
            .is_some_and(|clause| clause.trim().is_empty())
    }

    pub(crate) fn explicit_order(&self) -> Option<&str> {
        self.order
            .as_deref()
            .map(str::trim)
            .filter(|order| !order.is_empty())
    }
}

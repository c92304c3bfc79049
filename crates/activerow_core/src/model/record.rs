//! Single-row record model.
//!
//! # Responsibility
//! - Hold one row as an ordered field -> value mapping.
//! - Guarantee the key field is always present.
//!
//! # Invariants
//! - The key field is inserted on construction and can never be removed.
//! - Field order is insertion order; re-setting a field keeps its slot.

use crate::model::value::FieldValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One row keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    key_field: String,
    entries: Vec<(String, FieldValue)>,
}

impl Record {
    /// Creates a record that only carries an empty key.
    pub fn new(key_field: impl Into<String>) -> Self {
        let key_field = key_field.into();
        Self {
            entries: vec![(key_field.clone(), FieldValue::Null)],
            key_field,
        }
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Returns the key value, which is empty for unsaved records.
    pub fn id(&self) -> &FieldValue {
        // The key slot is created in `new` and never removed.
        &self.entries[0].1
    }

    pub fn set_id(&mut self, id: impl Into<FieldValue>) {
        self.entries[0].1 = id.into();
    }

    /// Returns `true` when the key value is empty.
    pub fn is_new(&self) -> bool {
        self.id().is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Inserts or replaces one field value.
    ///
    /// No whitelist is applied here; policy lives in the entity layer.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((field.to_string(), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the key field is permanently present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns ordered `(field, value)` pairs, skipping `exclusions`.
    pub fn to_pairs(&self, exclusions: &[&str]) -> Vec<(String, FieldValue)> {
        self.entries
            .iter()
            .filter(|(name, _)| !exclusions.contains(&name.as_str()))
            .cloned()
            .collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

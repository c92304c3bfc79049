//! Entity table binding configuration.
//!
//! # Responsibility
//! - Describe which table, key and whitelisted fields an entity binds to.
//! - Validate identifiers before any SQL is generated from them.
//!
//! # Invariants
//! - Key and field names are plain identifiers (`[A-Za-z_][A-Za-z0-9_]*`),
//!   so they double as `:name` bind tokens.
//! - Field names are unique and never repeat the key field.

use crate::entity::{EntityError, EntityResult};
use crate::sql::dialect::Dialect;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_KEY_FIELD: &str = "id";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Static description of one entity's table.
///
/// Loadable from JSON; omitted keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Target table. May be empty, in which case `save` is rejected.
    pub table: String,
    /// Key column; defaults to `id`.
    pub key_field: String,
    /// Whitelisted non-key columns in projection order.
    pub fields: Vec<String>,
    /// Identifier quoting pair; defaults to backticks.
    pub delimiters: (String, String),
    /// Write-once writability. `None` leaves the entity read-only until
    /// `Entity::set_writable` latches it.
    pub writable: Option<bool>,
    /// Explicit pagination dialect; detected from the connection when `None`.
    pub dialect: Option<Dialect>,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
            fields: Vec::new(),
            delimiters: ("`".to_string(), "`".to_string()),
            writable: None,
            dialect: None,
        }
    }
}

impl EntityConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.delimiters = (open.into(), close.into());
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Checks identifiers and field uniqueness.
    ///
    /// # Errors
    /// - `EntityError::Configuration` naming the first offending value.
    pub fn validate(&self) -> EntityResult<()> {
        if !is_identifier(&self.key_field) {
            return Err(EntityError::Configuration(format!(
                "key field `{}` is not a valid identifier",
                self.key_field
            )));
        }

        for (index, field) in self.fields.iter().enumerate() {
            if !is_identifier(field) {
                return Err(EntityError::Configuration(format!(
                    "field `{field}` is not a valid identifier"
                )));
            }
            if *field == self.key_field {
                return Err(EntityError::Configuration(format!(
                    "field `{field}` repeats the key field"
                )));
            }
            if self.fields[..index].contains(field) {
                return Err(EntityError::Configuration(format!(
                    "field `{field}` is listed twice"
                )));
            }
        }

        let (open, close) = &self.delimiters;
        let clashes =
            |delimiter: &String| !delimiter.is_empty() && self.table.contains(delimiter.as_str());
        if clashes(open) || clashes(close) {
            return Err(EntityError::Configuration(format!(
                "table `{}` contains an identifier delimiter",
                self.table
            )));
        }

        Ok(())
    }

    /// Wraps `name` in the configured delimiters.
    pub fn quote(&self, name: &str) -> String {
        format!("{}{}{}", self.delimiters.0, name, self.delimiters.1)
    }

    /// Returns `true` for whitelisted (writable) non-key fields.
    pub fn is_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name)
    }

    /// Returns `true` for the key field and every whitelisted field.
    pub fn is_declared(&self, name: &str) -> bool {
        name == self.key_field || self.is_field(name)
    }
}

fn is_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

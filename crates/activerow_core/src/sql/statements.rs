//! CRUD statement generation and the per-entity statement cache.
//!
//! # Responsibility
//! - Render the five CRUD statements for one entity configuration.
//! - Rebuild them only when the query shape signature changes.
//!
//! # Invariants
//! - Read statements always project `<key>, <fields...>`.
//! - Read-only shapes never carry create/update/delete statements.
//! - The cache holds SQL text; prepared handles are reused through the
//!   connection's own statement cache.

use crate::entity::config::EntityConfig;
use crate::sql::dialect::Dialect;
use crate::sql::options::FindOptions;
use log::debug;

const DEFAULT_WHERE: &str = "1=1";

/// Statement selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Read,
    ReadRange,
    Create,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadRange => "read_range",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Canonical signature of everything that changes generated SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryShape {
    pub where_clause: String,
    pub order: String,
    pub start: u32,
    pub limit: u32,
    pub include_key: bool,
    pub read_only: bool,
}

impl QueryShape {
    /// Shape with default predicate and ordering.
    pub fn base(config: &EntityConfig, read_only: bool) -> Self {
        Self {
            where_clause: DEFAULT_WHERE.to_string(),
            order: default_order(config),
            start: 0,
            limit: 0,
            include_key: false,
            read_only,
        }
    }

    /// Shape resolved from caller find options.
    pub fn for_find(config: &EntityConfig, options: &FindOptions, read_only: bool) -> Self {
        let mut shape = Self::base(config, read_only);
        if let Some(where_clause) = options.where_clause.as_deref() {
            shape.where_clause = where_clause.to_string();
        }
        if let Some(order) = options.explicit_order() {
            shape.order = order.to_string();
        }
        shape.start = options.start;
        shape.limit = options.limit;
        shape
    }

    /// Shape used by writes; `include_key` adds the key to insert columns.
    pub fn for_write(config: &EntityConfig, include_key: bool, read_only: bool) -> Self {
        Self {
            include_key,
            ..Self::base(config, read_only)
        }
    }
}

/// Default ordering: ascending by key.
pub fn default_order(config: &EntityConfig) -> String {
    format!("{} ASC", config.quote(&config.key_field))
}

/// Generated SQL for one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementSet {
    pub read: String,
    pub read_range: String,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

impl StatementSet {
    /// Renders all statements for `shape`.
    pub fn build(config: &EntityConfig, shape: &QueryShape, dialect: Dialect) -> Self {
        let table = config.quote(&config.table);
        let key = config.quote(&config.key_field);
        let columns = std::iter::once(config.key_field.as_str())
            .chain(config.fields.iter().map(String::as_str))
            .map(|name| config.quote(name))
            .collect::<Vec<_>>()
            .join(", ");

        let read = format!(
            "SELECT {columns} FROM {table} WHERE {} ORDER BY {}",
            shape.where_clause, shape.order
        );
        let read_range = dialect.range_sql(
            &columns,
            &table,
            &shape.where_clause,
            &shape.order,
            shape.start,
            shape.limit,
        );

        if shape.read_only {
            return Self {
                read,
                read_range,
                ..Self::default()
            };
        }

        let mut insert_fields: Vec<&str> = config.fields.iter().map(String::as_str).collect();
        if shape.include_key {
            insert_fields.push(config.key_field.as_str());
        }
        let create = if insert_fields.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                insert_fields
                    .iter()
                    .map(|name| config.quote(name))
                    .collect::<Vec<_>>()
                    .join(", "),
                insert_fields
                    .iter()
                    .map(|name| format!(":{name}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };

        let assignments = if config.fields.is_empty() {
            format!("{key} = :{}", config.key_field)
        } else {
            config
                .fields
                .iter()
                .map(|name| format!("{} = :{name}", config.quote(name)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let update = format!(
            "UPDATE {table} SET {assignments} WHERE {key} = :{}",
            config.key_field
        );
        let delete = format!("DELETE FROM {table} WHERE {key} = :{}", config.key_field);

        Self {
            read,
            read_range,
            create: Some(create),
            update: Some(update),
            delete: Some(delete),
        }
    }

    pub fn get(&self, kind: StatementKind) -> Option<&str> {
        match kind {
            StatementKind::Read => Some(self.read.as_str()),
            StatementKind::ReadRange => Some(self.read_range.as_str()),
            StatementKind::Create => self.create.as_deref(),
            StatementKind::Update => self.update.as_deref(),
            StatementKind::Delete => self.delete.as_deref(),
        }
    }
}

/// Statement set memoized by its shape signature.
#[derive(Debug, Clone)]
pub struct StatementCache {
    dialect: Dialect,
    shape: Option<QueryShape>,
    statements: StatementSet,
    rebuilds: usize,
}

impl StatementCache {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            shape: None,
            statements: StatementSet::default(),
            rebuilds: 0,
        }
    }

    /// Returns the statements for `shape`, rebuilding only on signature change.
    pub fn prepare(&mut self, config: &EntityConfig, shape: QueryShape) -> &StatementSet {
        if self.shape.as_ref() != Some(&shape) {
            self.statements = StatementSet::build(config, &shape, self.dialect);
            self.rebuilds += 1;
            debug!(
                "event=statements_rebuild module=sql status=ok table={} dialect={} paged={} include_key={} read_only={} rebuilds={}",
                config.table,
                self.dialect,
                shape.limit > 0,
                shape.include_key,
                shape.read_only,
                self.rebuilds
            );
            self.shape = Some(shape);
        }
        &self.statements
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Number of times the statement set has been regenerated.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn current(&self) -> Option<(&QueryShape, &StatementSet)> {
        self.shape.as_ref().map(|shape| (shape, &self.statements))
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryShape, StatementCache, StatementKind, StatementSet};
    use crate::entity::config::EntityConfig;
    use crate::sql::dialect::Dialect;
    use crate::sql::options::FindOptions;

    fn config() -> EntityConfig {
        EntityConfig::new("people").fields(["name", "email"]).writable(true)
    }

    #[test]
    fn builds_quoted_crud_statements() {
        let config = config();
        let set = StatementSet::build(
            &config,
            &QueryShape::base(&config, false),
            Dialect::OffsetLimit,
        );

        assert_eq!(
            set.read,
            "SELECT `id`, `name`, `email` FROM `people` WHERE 1=1 ORDER BY `id` ASC"
        );
        assert_eq!(
            set.get(StatementKind::Create),
            Some("INSERT INTO `people` (`name`, `email`) VALUES (:name, :email)")
        );
        assert_eq!(
            set.get(StatementKind::Update),
            Some("UPDATE `people` SET `name` = :name, `email` = :email WHERE `id` = :id")
        );
        assert_eq!(
            set.get(StatementKind::Delete),
            Some("DELETE FROM `people` WHERE `id` = :id")
        );
    }

    #[test]
    fn include_key_adds_key_to_insert_columns() {
        let config = config();
        let set = StatementSet::build(
            &config,
            &QueryShape::for_write(&config, true, false),
            Dialect::OffsetLimit,
        );
        assert_eq!(
            set.create.as_deref(),
            Some("INSERT INTO `people` (`name`, `email`, `id`) VALUES (:name, :email, :id)")
        );
    }

    #[test]
    fn read_only_shape_has_no_write_statements() {
        let config = config();
        let set = StatementSet::build(
            &config,
            &QueryShape::base(&config, true),
            Dialect::OffsetLimit,
        );
        assert!(set.get(StatementKind::Create).is_none());
        assert!(set.get(StatementKind::Update).is_none());
        assert!(set.get(StatementKind::Delete).is_none());
        assert!(set.get(StatementKind::Read).is_some());
    }

    #[test]
    fn custom_delimiters_and_find_shape_flow_into_sql() {
        let config = EntityConfig::new("people")
            .fields(["name"])
            .delimiters("[", "]");
        let options = FindOptions::new()
            .filter("[name] LIKE 'a%'")
            .order_by("[name] DESC")
            .range(10, 5);
        let shape = QueryShape::for_find(&config, &options, true);
        let set = StatementSet::build(&config, &shape, Dialect::OffsetLimit);
        assert_eq!(
            set.read_range,
            "SELECT [id], [name] FROM [people] WHERE [name] LIKE 'a%' ORDER BY [name] DESC LIMIT 10, 5"
        );
    }

    #[test]
    fn blank_order_falls_back_to_key_ascending() {
        let config = config();
        let shape = QueryShape::for_find(&config, &FindOptions::new().order_by("  "), false);
        assert_eq!(shape.order, "`id` ASC");
    }

    #[test]
    fn fieldless_entity_uses_default_values_insert() {
        let config = EntityConfig::new("tokens").writable(true);
        let set = StatementSet::build(
            &config,
            &QueryShape::base(&config, false),
            Dialect::OffsetLimit,
        );
        assert_eq!(set.create.as_deref(), Some("INSERT INTO `tokens` DEFAULT VALUES"));
        assert_eq!(
            set.update.as_deref(),
            Some("UPDATE `tokens` SET `id` = :id WHERE `id` = :id")
        );
    }

    #[test]
    fn cache_rebuilds_only_on_signature_change() {
        let config = config();
        let mut cache = StatementCache::new(Dialect::OffsetLimit);

        cache.prepare(&config, QueryShape::base(&config, false));
        cache.prepare(&config, QueryShape::base(&config, false));
        assert_eq!(cache.rebuild_count(), 1);

        let paged = QueryShape::for_find(&config, &FindOptions::new().range(0, 2), false);
        cache.prepare(&config, paged.clone());
        cache.prepare(&config, paged);
        assert_eq!(cache.rebuild_count(), 2);

        cache.prepare(&config, QueryShape::for_write(&config, true, false));
        assert_eq!(cache.rebuild_count(), 3);
        let (shape, _) = cache.current().unwrap();
        assert!(shape.include_key);
    }
}

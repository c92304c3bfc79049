//! Active-record orchestration over one table.
//!
//! # Responsibility
//! - Run finds, saves and deletes through the statement cache.
//! - Keep the fetched record set and its cursor in sync with writes.
//! - Enforce read-only and field-whitelist policy.
//! - Emit lifecycle events after each committed state change.
//!
//! # Invariants
//! - `save`/`delete` on a read-only entity fail before any transaction.
//! - A failed write leaves the connection in autocommit mode.
//! - While locked, `find`, `reset`, `remove`, `clear`, `invert` and cursor
//!   moves are no-ops; saves still persist but never move the cursor.
//! - Writes to non-whitelisted fields are rejected without mutation;
//!   reads of undeclared fields fail with `EntityError::Lookup`.

use crate::entity::config::EntityConfig;
use crate::entity::{EntityError, EntityResult};
use crate::event::{EntityEvent, EventBus, EventKind, ListenerId};
use crate::model::record::Record;
use crate::model::record_set::RecordSet;
use crate::model::value::{FieldMap, FieldValue};
use crate::sql::dialect::Dialect;
use crate::sql::execute::{execute_statement, query_records};
use crate::sql::options::FindOptions;
use crate::sql::statements::{default_order, QueryShape, StatementCache, StatementKind};
use log::{debug, error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Active-record entity bound to one table on one connection.
pub struct Entity<'conn> {
    conn: &'conn Connection,
    config: EntityConfig,
    writable: Option<bool>,
    statements: StatementCache,
    records: RecordSet,
    events: EventBus,
}

impl<'conn> Entity<'conn> {
    /// Validates `config`, resolves the pagination dialect and prepares the
    /// default statement set.
    ///
    /// # Errors
    /// - `EntityError::Configuration` for invalid identifiers.
    /// - `EntityError::Dialect` when no dialect probe prepares.
    pub fn new(conn: &'conn Connection, config: EntityConfig) -> EntityResult<Self> {
        config.validate()?;

        let dialect = match config.dialect {
            Some(dialect) => dialect,
            None => Dialect::detect(conn).ok_or_else(|| {
                EntityError::Dialect(format!(
                    "none of {:?} prepared for table `{}`",
                    Dialect::ALL,
                    config.table
                ))
            })?,
        };

        let mut entity = Self {
            conn,
            writable: config.writable,
            statements: StatementCache::new(dialect),
            records: RecordSet::new(config.key_field.as_str()),
            events: EventBus::new(),
            config,
        };
        let shape = QueryShape::base(&entity.config, entity.is_read_only());
        entity.statements.prepare(&entity.config, shape);
        Ok(entity)
    }

    // configuration

    /// Latches writability once. Returns `false` when already latched.
    pub fn set_writable(&mut self, writable: bool) -> bool {
        if self.writable.is_some() {
            return false;
        }
        self.writable = Some(writable);
        true
    }

    pub fn is_read_only(&self) -> bool {
        self.writable != Some(true)
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    pub fn key_field(&self) -> &str {
        &self.config.key_field
    }

    pub fn field_list(&self) -> &[String] {
        &self.config.fields
    }

    pub fn dialect(&self) -> Dialect {
        self.statements.dialect()
    }

    pub fn statements(&self) -> &StatementCache {
        &self.statements
    }

    // events

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&EntityEvent) + 'static,
    ) -> ListenerId {
        self.events.subscribe(kind, listener)
    }

    pub fn subscribe_all(&mut self, listener: impl FnMut(&EntityEvent) + 'static) -> ListenerId {
        self.events.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // accessors

    /// Copy of the active record.
    pub fn record(&self) -> Record {
        self.records.current().clone()
    }

    /// Copies of all fetched records.
    pub fn records(&self) -> Vec<Record> {
        self.records.rows().to_vec()
    }

    pub fn id(&self) -> FieldValue {
        self.records.current().id().clone()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn position(&self) -> isize {
        self.records.position()
    }

    pub fn has_records(&self) -> bool {
        self.records.has_records()
    }

    /// Returns `true` while the active record is positioned (or keyed).
    pub fn is_available(&self) -> bool {
        self.records.is_available()
    }

    pub fn is_locked(&self) -> bool {
        self.records.is_locked()
    }

    /// Active record as ordered pairs, skipping `exclusions`.
    pub fn to_array(&self, exclusions: &[&str]) -> Vec<(String, FieldValue)> {
        self.records.current().to_pairs(exclusions)
    }

    // field access

    /// Reads one declared field, with text normalized to UTF-8.
    ///
    /// # Errors
    /// - `EntityError::Lookup` when `name` is neither the key nor whitelisted.
    pub fn field(&self, name: &str) -> EntityResult<FieldValue> {
        if !self.config.is_declared(name) {
            return Err(EntityError::Lookup(name.to_string()));
        }
        Ok(self
            .records
            .current()
            .get(name)
            .map(FieldValue::normalized)
            .unwrap_or_default())
    }

    /// Text rendering of `field`; `Null` renders as an empty string.
    pub fn text(&self, name: &str) -> EntityResult<String> {
        Ok(self.field(name)?.to_string())
    }

    /// Writes one whitelisted field. Returns `false` without mutating the
    /// record when `name` is not whitelisted.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        if !self.config.is_field(name) {
            debug!(
                "event=entity_set module=entity status=ignored table={} field={}",
                self.config.table, name
            );
            return false;
        }
        self.records.current_mut().set(name, value);
        true
    }

    pub fn set_id(&mut self, id: impl Into<FieldValue>) {
        self.records.current_mut().set_id(id);
    }

    /// Replaces the active record with the declared fields of `record`.
    ///
    /// The entity counts as positioned when the new record carries a key.
    pub fn set_record(&mut self, record: &Record) {
        let mut active = Record::new(self.config.key_field.as_str());
        for (name, value) in record.iter() {
            if self.config.is_declared(name) {
                active.set(name, value.clone());
            }
        }
        self.records.set_current(active);
    }

    // query

    /// Runs a read and replaces the record set with its rows.
    ///
    /// Returns `false` without querying when locked or when a blank
    /// `where_clause` was supplied.
    pub fn find(&mut self, options: &FindOptions) -> EntityResult<bool> {
        if self.records.is_locked() {
            return Ok(false);
        }
        if options.has_blank_where() {
            debug!(
                "event=entity_find module=entity status=skipped table={} reason=blank_where",
                self.config.table
            );
            return Ok(false);
        }

        let started_at = Instant::now();
        let shape = QueryShape::for_find(&self.config, options, self.is_read_only());
        let kind = if options.is_paged() {
            StatementKind::ReadRange
        } else {
            StatementKind::Read
        };
        let statement = self
            .statements
            .prepare(&self.config, shape)
            .get(kind)
            .unwrap_or_default()
            .to_string();
        let params = self.find_params(options);

        let rows = match query_records(self.conn, &statement, &params, &self.config.key_field) {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    "event=entity_find module=entity status=error table={} kind={} duration_ms={} error={}",
                    self.config.table,
                    kind.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        let count = rows.len();
        self.events.emit(&EntityEvent::Find {
            statement,
            options: options.clone(),
            rows: count,
        });
        self.records.replace(rows);

        debug!(
            "event=entity_find module=entity status=ok table={} kind={} rows={} duration_ms={}",
            self.config.table,
            kind.as_str(),
            count,
            started_at.elapsed().as_millis()
        );
        Ok(true)
    }

    /// Finds by key; with `fetch`, also positions on the first row.
    ///
    /// Returns whether the entity ends up positioned.
    pub fn find_id(&mut self, id: impl Into<FieldValue>, fetch: bool) -> EntityResult<bool> {
        let predicate = self.key_predicate(&id.into());
        self.find(&FindOptions::new().filter(predicate))?;
        Ok(fetch && self.first())
    }

    /// Finds every row whose key is in `ids`. An empty list resets the
    /// record set without querying.
    pub fn find_ids<I, V>(&mut self, ids: I) -> EntityResult<bool>
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let predicates: Vec<String> = ids
            .into_iter()
            .map(|id| self.key_predicate(&id.into()))
            .collect();
        if predicates.is_empty() {
            self.reset();
            return Ok(false);
        }
        self.find(&FindOptions::new().filter(predicates.join(" OR ")))
    }

    // positioning

    /// Drops fetched rows. Returns `false` while locked.
    pub fn reset(&mut self) -> bool {
        self.records.reset()
    }

    /// Un-positions the cursor and empties the active record. Returns
    /// `false` while locked.
    pub fn clear(&mut self) -> bool {
        self.records.clear()
    }

    pub fn first(&mut self) -> bool {
        let moved = self.records.first();
        self.announce(moved)
    }

    pub fn prev(&mut self) -> bool {
        let moved = self.records.prev();
        self.announce(moved)
    }

    pub fn next(&mut self) -> bool {
        let moved = self.records.next();
        self.announce(moved)
    }

    pub fn last(&mut self) -> bool {
        let moved = self.records.last();
        self.announce(moved)
    }

    pub fn get(&mut self, index: isize) -> bool {
        let moved = self.records.get(index);
        self.announce(moved)
    }

    /// Reverses the fetched rows and clears the cursor. Returns `false`
    /// while locked.
    pub fn invert(&mut self) -> bool {
        self.records.invert()
    }

    /// Freezes querying and cursor movement for the rest of this instance.
    pub fn lock_record(&mut self) {
        self.records.lock();
        info!(
            "event=entity_lock module=entity status=ok table={} position={}",
            self.config.table,
            self.records.position()
        );
    }

    /// Evicts the positioned row from memory and steps back one row.
    pub fn remove(&mut self) -> bool {
        if !self.records.remove() {
            return false;
        }
        self.prev();
        true
    }

    /// Visits every fetched row from the start, positioning the entity on
    /// each before calling `callback`.
    pub fn each(&mut self, mut callback: impl FnMut(&mut Self)) {
        if self.records.is_locked() {
            return;
        }
        self.records.clear();
        while self.next() {
            callback(&mut *self);
        }
    }

    // writing

    /// Inserts or updates the active record.
    ///
    /// Returns `true` for inserts. New keys come from `last_insert_rowid`
    /// unless the caller supplied one.
    ///
    /// # Errors
    /// - `EntityError::Configuration` when read-only or no table is set.
    /// - `EntityError::Persistence` when the write or commit fails.
    pub fn save(&mut self) -> EntityResult<bool> {
        self.ensure_writable()?;
        if self.config.table.trim().is_empty() {
            return Err(EntityError::Configuration("no table set".to_string()));
        }

        let mut record = self.records.current().clone();
        let is_new = !self.records.is_available() || record.is_new();
        let include_key = !record.is_new();

        let mut params: FieldMap = self
            .config
            .fields
            .iter()
            .map(|field| (field.clone(), FieldValue::Null))
            .collect();
        for (name, value) in record.iter() {
            if name != self.config.key_field {
                params.insert(name.to_string(), value.clone());
            }
        }
        if include_key {
            params.insert(self.config.key_field.clone(), record.id().clone());
        }

        let kind = if is_new {
            StatementKind::Create
        } else {
            StatementKind::Update
        };
        let statement = self.write_statement(kind, include_key)?;

        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Err(source) = execute_statement(&tx, &statement, &params) {
            return Err(self.rolled_back(tx, kind, source));
        }
        if is_new && record.is_new() {
            record.set_id(self.conn.last_insert_rowid());
        }
        if let Err(source) = tx.commit() {
            return Err(self.failed(kind, source));
        }

        if is_new {
            self.records.push(record);
        } else {
            self.records.write_back(record);
        }

        info!(
            "event=entity_save module=entity status=ok table={} kind={} duration_ms={}",
            self.config.table,
            kind.as_str(),
            started_at.elapsed().as_millis()
        );
        self.events.emit(&if is_new {
            EntityEvent::Create { statement, params }
        } else {
            EntityEvent::Update { statement, params }
        });

        Ok(is_new)
    }

    /// Deletes the positioned record; with `remove`, also evicts it from
    /// the in-memory record set.
    ///
    /// # Errors
    /// - `EntityError::Position` when no record is positioned.
    /// - `EntityError::Configuration` when read-only.
    /// - `EntityError::Persistence` when the delete or commit fails.
    pub fn delete(&mut self, remove: bool) -> EntityResult<()> {
        if !self.records.is_available() {
            return Err(EntityError::Position);
        }
        self.ensure_writable()?;

        let mut params = FieldMap::new();
        params.insert(
            self.config.key_field.clone(),
            self.records.current().id().clone(),
        );
        let statement = self.write_statement(StatementKind::Delete, true)?;

        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Err(source) = execute_statement(&tx, &statement, &params) {
            return Err(self.rolled_back(tx, StatementKind::Delete, source));
        }
        if let Err(source) = tx.commit() {
            return Err(self.failed(StatementKind::Delete, source));
        }

        info!(
            "event=entity_delete module=entity status=ok table={} duration_ms={}",
            self.config.table,
            started_at.elapsed().as_millis()
        );
        self.events.emit(&EntityEvent::Delete { statement, params });

        if remove {
            self.remove();
        }
        Ok(())
    }

    fn ensure_writable(&self) -> EntityResult<()> {
        if self.is_read_only() {
            return Err(EntityError::Configuration(
                "entity is read only".to_string(),
            ));
        }
        Ok(())
    }

    fn write_statement(&mut self, kind: StatementKind, include_key: bool) -> EntityResult<String> {
        let shape = QueryShape::for_write(&self.config, include_key, self.is_read_only());
        self.statements
            .prepare(&self.config, shape)
            .get(kind)
            .map(str::to_string)
            .ok_or_else(|| {
                EntityError::Configuration(format!("{} statement unavailable", kind.as_str()))
            })
    }

    fn rolled_back(
        &self,
        tx: Transaction<'_>,
        kind: StatementKind,
        source: rusqlite::Error,
    ) -> EntityError {
        if let Err(err) = tx.rollback() {
            error!(
                "event=entity_rollback module=entity status=error table={} kind={} error={}",
                self.config.table,
                kind.as_str(),
                err
            );
        }
        self.failed(kind, source)
    }

    fn failed(&self, kind: StatementKind, source: rusqlite::Error) -> EntityError {
        error!(
            "event=entity_write module=entity status=error table={} kind={} error={}",
            self.config.table,
            kind.as_str(),
            source
        );
        EntityError::Persistence {
            operation: kind.as_str(),
            source,
        }
    }

    fn find_params(&self, options: &FindOptions) -> FieldMap {
        let mut params = FieldMap::new();
        params.insert(
            "order".to_string(),
            FieldValue::Text(default_order(&self.config)),
        );
        params.insert("start".to_string(), FieldValue::from(i64::from(options.start)));
        params.insert("limit".to_string(), FieldValue::from(i64::from(options.limit)));
        params.extend(
            options
                .params
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        params.insert(
            "table".to_string(),
            FieldValue::Text(self.config.table.clone()),
        );
        params
    }

    fn key_predicate(&self, id: &FieldValue) -> String {
        format!(
            "{} = {}",
            self.config.quote(&self.config.key_field),
            id.to_quoted_literal()
        )
    }

    fn announce(&mut self, moved: Option<usize>) -> bool {
        match moved {
            Some(position) => {
                self.events.emit(&EntityEvent::Read { position });
                true
            }
            None => false,
        }
    }
}

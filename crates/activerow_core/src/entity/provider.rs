//! Lazy, memoizing entity provider.
//!
//! # Responsibility
//! - Bind an entity definition type to a connection.
//! - Construct its `Entity` on first use and hand out the same instance after.

use crate::entity::active::Entity;
use crate::entity::config::EntityConfig;
use crate::entity::EntityResult;
use rusqlite::Connection;
use std::marker::PhantomData;

/// Domain type that knows which table it binds to.
pub trait EntityDefinition {
    fn config() -> EntityConfig;
}

/// Provides exactly one `Entity` per provider for definition `D`.
pub struct EntityProvider<'conn, D: EntityDefinition> {
    conn: &'conn Connection,
    entity: Option<Entity<'conn>>,
    provided_name: &'static str,
    _definition: PhantomData<D>,
}

impl<'conn, D: EntityDefinition> EntityProvider<'conn, D> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            entity: None,
            provided_name: short_type_name::<D>(),
            _definition: PhantomData,
        }
    }

    /// Short type name of `D`, e.g. `Contact` for `app::model::Contact`.
    pub fn provided_name(&self) -> &'static str {
        self.provided_name
    }

    pub fn is_initialized(&self) -> bool {
        self.entity.is_some()
    }

    /// Returns the memoized entity, constructing it on first call.
    pub fn instance(&mut self) -> EntityResult<&mut Entity<'conn>> {
        let entity = match self.entity.take() {
            Some(entity) => entity,
            None => Entity::new(self.conn, D::config())?,
        };
        Ok(self.entity.insert(entity))
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

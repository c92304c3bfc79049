//! Entity lifecycle events and synchronous listener dispatch.
//!
//! # Responsibility
//! - Describe what an entity did (find, reposition, insert, update, delete).
//! - Fan events out to injected listeners in registration order.
//!
//! # Invariants
//! - Events are emitted only after the corresponding state change commits.
//! - Listeners observe immutable events and cannot alter the operation.

use crate::model::value::FieldMap;
use crate::sql::options::FindOptions;
use std::fmt::{Debug, Formatter};

/// Event discriminant used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Find,
    Read,
    Create,
    Update,
    Delete,
}

/// One lifecycle notification.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    /// A read completed; emitted before the record set is replaced.
    Find {
        statement: String,
        options: FindOptions,
        rows: usize,
    },
    /// The cursor moved onto a row.
    Read { position: usize },
    Create { statement: String, params: FieldMap },
    Update { statement: String, params: FieldMap },
    Delete { statement: String, params: FieldMap },
}

impl EntityEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Find { .. } => EventKind::Find,
            Self::Read { .. } => EventKind::Read,
            Self::Create { .. } => EventKind::Create,
            Self::Update { .. } => EventKind::Update,
            Self::Delete { .. } => EventKind::Delete,
        }
    }

    /// Executed statement text, when the event came from SQL execution.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Find { statement, .. }
            | Self::Create { statement, .. }
            | Self::Update { statement, .. }
            | Self::Delete { statement, .. } => Some(statement.as_str()),
            Self::Read { .. } => None,
        }
    }
}

pub type ListenerId = usize;

type Listener = Box<dyn FnMut(&EntityEvent)>;

struct Subscription {
    id: ListenerId,
    kind: Option<EventKind>,
    listener: Listener,
}

/// Per-entity listener registry.
#[derive(Default)]
pub struct EventBus {
    next_id: ListenerId,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event kind.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&EntityEvent) + 'static,
    ) -> ListenerId {
        self.push(Some(kind), Box::new(listener))
    }

    /// Registers a listener for every event kind.
    pub fn subscribe_all(&mut self, listener: impl FnMut(&EntityEvent) + 'static) -> ListenerId {
        self.push(None, Box::new(listener))
    }

    /// Removes one listener. Returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Delivers `event` synchronously to matching listeners.
    pub fn emit(&mut self, event: &EntityEvent) {
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.kind.map_or(true, |wanted| wanted == kind) {
                (subscription.listener)(event);
            }
        }
    }

    fn push(&mut self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }
}

impl Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}

//! Event names, correlation ids and the listener registry.
//!
//! Every event published on the bus is routed by an [`EventName`]. Request
//! events are paired with the response event the responding module is expected
//! to publish back; the pairing used to be an out-of-band naming convention
//! between modules, here it is encoded in [`EventName::response`].

use std::{fmt, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_bus::Event;

/// Routing key for events on the bus.
///
/// `Custom` keeps the registry open for event names that only exist by
/// convention between two modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString, PartialOrd, Ord)]
pub enum EventName {
    /// A module needs the externally computed balance sheet figures.
    BalanceSheetPostDataRequested,
    /// Carries the computed figures back to the requesting module.
    BalanceSheetPostDataRetrieved,
    /// A deleted fund usage row requires the linked salary record cancelled.
    CancelEmployeeSalary,
    /// Confirms (or fails) the salary cancellation.
    EmployeeSalaryDeleted,
    #[strum(default)]
    Custom(String),
}

impl EventName {
    /// The response event paired with a request event, if any.
    ///
    /// Requester and responder must agree on this pairing; encoding it here
    /// keeps the two sides from drifting apart.
    pub fn response(&self) -> Option<EventName> {
        match self {
            EventName::BalanceSheetPostDataRequested => {
                Some(EventName::BalanceSheetPostDataRetrieved)
            }
            EventName::CancelEmployeeSalary => Some(EventName::EmployeeSalaryDeleted),
            _ => None,
        }
    }

    /// Whether this name carries a response back to a waiting coordinator.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            EventName::BalanceSheetPostDataRetrieved | EventName::EmployeeSalaryDeleted
        )
    }
}

/// Correlation id carried by a request event and echoed by its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Callback registered for an event name.
pub type EventHandler = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Ordered subscriber lists keyed by event name.
///
/// Insertion order is invocation order. `subscribe` never deduplicates, so a
/// caller that must keep the listener count at one removes the whole list
/// first (see `RequestManager`).
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<EventName, Vec<EventHandler>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `event_name`.
    pub fn subscribe(&self, event_name: EventName, handler: EventHandler) {
        self.listeners.entry(event_name).or_default().push(handler);
    }

    /// Clears every listener registered for `event_name`, returning how many
    /// were removed.
    pub fn remove_listeners(&self, event_name: &EventName) -> usize {
        self.listeners
            .remove(event_name)
            .map(|(_, handlers)| handlers.len())
            .unwrap_or(0)
    }

    /// Snapshot of the current handler list, in registration order.
    pub fn handlers_for(&self, event_name: &EventName) -> Vec<EventHandler> {
        self.listeners
            .get(event_name)
            .map(|handlers| handlers.clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event_name: &EventName) -> usize {
        self.listeners
            .get(event_name)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }
}

//! # Event Bus Implementation
//!
//! The EventBus is the messaging hub the simkeu modules use to reach each
//! other without compile-time dependencies. It routes events by name to the
//! ordered listener lists held in the [`ListenerRegistry`].
//!
//! ## Dispatch Semantics
//!
//! `publish` invokes every listener currently registered for the event name,
//! in registration order, and returns once the listeners have been *invoked*,
//! never awaiting their completion. A listener that performs asynchronous work
//! (a repository read, another publish) signals completion by publishing a
//! second event on the paired response name; the original caller awaits that
//! event, not the listener itself.
//!
//! ## Failure Semantics
//!
//! The bus carries failures in the data channel, not as panics or errors: a
//! listener that wants to fail a remote coordinator publishes an
//! [`EventData::Error`] envelope. The `RequestManager::respond` helper does
//! this automatically for fallible handlers.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::event_registry::{EventHandler, EventName, ListenerRegistry, RequestId};

/// A discrete message on the bus: the routing name, an optional correlation
/// id, the payload and the time the event occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_name: EventName,
    /// Set on request events and echoed back on their responses.
    pub request_id: Option<RequestId>,
    pub data: EventData,
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    pub fn new(event_name: EventName, data: EventData) -> Self {
        Self {
            event_name,
            request_id: None,
            data,
            occurred_at: Utc::now(),
        }
    }

    pub fn request_builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn response_builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    /// Deserializes the success payload into a concrete type.
    ///
    /// Fails on an error envelope; responders use this to read the request
    /// parameters, coordinators to read the retrieved figures.
    pub fn payload<T: DeserializeOwned>(&self) -> EventResult<T> {
        match &self.data {
            EventData::Payload(value) => {
                serde_json::from_value(value.clone()).map_err(|e| EventError::InvalidPayload {
                    event_name: self.event_name.to_string(),
                    message: e.to_string(),
                })
            }
            EventData::Error(err) => Err(EventError::InvalidPayload {
                event_name: self.event_name.to_string(),
                message: format!("error envelope instead of payload: {}", err.message),
            }),
        }
    }
}

/// Payload of an event: a success value or the structured error triple.
///
/// Serialized form of the error arm is `{"status":"error","code":...,
/// "message":...}`, the shape every module's HTTP layer already understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    Error(ErrorData),
    Payload(Value),
}

impl EventData {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        EventData::Error(ErrorData::new(code, message))
    }

    pub fn into_result(self) -> Result<Value, ErrorData> {
        match self {
            EventData::Payload(value) => Ok(value),
            EventData::Error(err) => Err(err),
        }
    }
}

/// The error triple carried in the data channel of a response event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    status: ErrorStatus,
    pub code: u16,
    pub message: String,
}

impl ErrorData {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Error,
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
enum ErrorStatus {
    #[default]
    #[serde(rename = "error")]
    Error,
}

/// Builder for request events. The event name must have a paired response
/// name, and a correlation id is required so the response can find its way
/// back.
#[derive(Default)]
pub struct RequestBuilder {
    event_name: Option<EventName>,
    request_id: Option<RequestId>,
    payload: Option<serde_json::Result<Value>>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn event_name(mut self, event_name: EventName) -> Self {
        self.event_name = Some(event_name);
        self
    }

    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload = Some(serde_json::to_value(payload));
        self
    }

    pub fn build(self) -> EventResult<Event> {
        let event_name = self.event_name.ok_or(EventError::RequestBuilderFailed(
            "event_name is required".to_string(),
        ))?;
        if event_name.response().is_none() {
            return Err(EventError::UnpairedEvent(event_name.to_string()));
        }
        let request_id = self.request_id.ok_or(EventError::RequestBuilderFailed(
            "request_id is required".to_string(),
        ))?;
        let data = match self.payload {
            Some(Ok(value)) => EventData::Payload(value),
            Some(Err(e)) => {
                return Err(EventError::InvalidPayload {
                    event_name: event_name.to_string(),
                    message: e.to_string(),
                })
            }
            None => EventData::Payload(Value::Null),
        };
        Ok(Event {
            event_name,
            request_id: Some(request_id),
            data,
            occurred_at: Utc::now(),
        })
    }
}

/// Builder for response events, with explicit success and failure arms.
#[derive(Default)]
pub struct ResponseBuilder {
    is_success: Option<bool>,
    event_name: Option<EventName>,
    request_id: Option<RequestId>,
    response: Option<serde_json::Result<Value>>,
    error: Option<ErrorData>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn success(mut self) -> Self {
        self.is_success = Some(true);
        self
    }

    pub fn failure(mut self) -> Self {
        self.is_success = Some(false);
        self
    }

    pub fn event_name(mut self, event_name: EventName) -> Self {
        self.event_name = Some(event_name);
        self
    }

    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn response<T: Serialize>(mut self, response: &T) -> Self {
        self.response = Some(serde_json::to_value(response));
        self
    }

    pub fn error(mut self, code: u16, message: impl Into<String>) -> Self {
        self.error = Some(ErrorData::new(code, message));
        self
    }

    pub fn build(self) -> EventResult<Event> {
        let event_name = self.event_name.ok_or(EventError::ResponseBuilderFailed(
            "event_name is required".to_string(),
        ))?;
        let request_id = self.request_id.ok_or(EventError::ResponseBuilderFailed(
            "request_id is required".to_string(),
        ))?;
        let data = match self.is_success {
            Some(true) => match self.response {
                Some(Ok(value)) => EventData::Payload(value),
                Some(Err(e)) => {
                    return Err(EventError::InvalidPayload {
                        event_name: event_name.to_string(),
                        message: e.to_string(),
                    })
                }
                None => EventData::Payload(Value::Null),
            },
            Some(false) => EventData::Error(self.error.ok_or(
                EventError::ResponseBuilderFailed("error is required for a failure".to_string()),
            )?),
            None => {
                return Err(EventError::ResponseBuilderFailed(
                    "is_success is required".to_string(),
                ))
            }
        };
        Ok(Event {
            event_name,
            request_id: Some(request_id),
            data,
            occurred_at: Utc::now(),
        })
    }
}

/// # EventBus
///
/// Routes published events to the listeners registered for their name.
/// Constructed once by the composition root and injected into every service
/// that needs it; there is no process-wide instance.
#[derive(Default)]
pub struct EventBus {
    registry: ListenerRegistry,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::new(),
        }
    }

    /// Registers `handler` for `event_name`. Duplicate registrations are kept
    /// and each will fire per publish; callers that need exactly one listener
    /// call [`EventBus::remove_listeners`] first.
    pub fn subscribe(&self, event_name: EventName, handler: EventHandler) {
        self.registry.subscribe(event_name, handler);
    }

    /// Closure-friendly variant of [`EventBus::subscribe`].
    pub fn subscribe_fn<F, Fut>(&self, event_name: EventName, f: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.subscribe(event_name, std::sync::Arc::new(move |event| f(event).boxed()));
    }

    /// Invokes every listener registered for the event's name, in
    /// registration order. Listener futures are spawned; `publish` does not
    /// wait for them to finish. Publishing with no listeners is a no-op.
    pub async fn publish(&self, event: Event) -> EventResult<()> {
        debug_event("Publishing", &event);
        for handler in self.registry.handlers_for(&event.event_name) {
            tokio::spawn(handler(event.clone()));
        }
        Ok(())
    }

    /// Clears every listener for `event_name`, returning how many were
    /// removed.
    pub fn remove_listeners(&self, event_name: &EventName) -> usize {
        self.registry.remove_listeners(event_name)
    }

    pub fn listener_count(&self, event_name: &EventName) -> usize {
        self.registry.listener_count(event_name)
    }
}

pub fn debug_event(prefix: &str, event: &Event) {
    debug!(
        event_name = %event.event_name,
        request_id = ?event.request_id,
        "{} event", prefix
    );
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Invalid payload for {event_name}: {message}")]
    InvalidPayload { event_name: String, message: String },

    #[error("No response event is paired with {0}")]
    UnpairedEvent(String),

    #[error("request builder failed: {0}")]
    RequestBuilderFailed(String),

    #[error("response builder failed: {0}")]
    ResponseBuilderFailed(String),
}

pub type EventResult<T> = Result<T, EventError>;

//! # Request Manager
//!
//! The RequestManager provides a synchronous request-response pattern on top
//! of the asynchronous event bus. A coordinator publishes a request event and
//! waits for the paired response event, with timeout handling and correlation.
//!
//! ## Key Features
//!
//! - **Correlation**: every request carries a unique id; the response echoes
//!   it, so concurrent calls to the same operation cannot steal each other's
//!   reply
//! - **Bounded wait**: a request whose responder never answers fails with
//!   [`RequestError::Timeout`] instead of hanging the caller
//! - **One listener per response name**: the response dispatcher is installed
//!   remove-then-subscribe, so repeated coordinator runs never accumulate
//!   stale listeners
//! - **Responder helper**: [`RequestManager::respond`] turns a fallible
//!   handler into a subscriber that always answers, publishing either the
//!   success payload or the structured error envelope
//!
//! ## Implementation Details
//!
//! Tokio oneshot channels bridge the gap between the event bus and the
//! waiting coordinator. When a request is made, a oneshot receiver is
//! registered and the sender is stored under the request id. When the
//! response arrives, the dispatcher forwards it through the oneshot channel
//! to awaken the waiting task.

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{instrument, warn};

use crate::{
    error::AppError,
    event_bus::{Event, EventBus, EventError},
    event_registry::{EventName, RequestId},
};

/// A request awaiting its response.
struct PendingRequest {
    /// Channel for delivering the response back to the requester.
    sender: oneshot::Sender<Event>,
    /// The original request name, kept for cancellation messages.
    request_name: EventName,
}

/// # Request Manager
///
/// Coordinates the request-response pattern on top of the event bus. One
/// instance is owned by the composition root and shared by every module that
/// requests or responds.
pub struct RequestManager {
    event_bus: Arc<EventBus>,
    /// Pending requests indexed by correlation id.
    pending: Arc<DashMap<RequestId, PendingRequest>>,
    /// Applied to every request; a responder that never answers fails the
    /// caller after this long.
    default_timeout: Duration,
}

impl RequestManager {
    pub fn new(event_bus: Arc<EventBus>, default_timeout: Duration) -> Self {
        Self {
            event_bus,
            pending: Arc::new(DashMap::new()),
            default_timeout,
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// Publishes a request event and waits for the paired response event.
    ///
    /// The returned event is whatever the responder published, success or
    /// error envelope alike; [`RequestManager::request_payload`] additionally
    /// unwraps the envelope.
    #[instrument(skip(self, request), fields(event_name = %request.event_name))]
    pub async fn request(&self, request: Event) -> RequestResult<Event> {
        let request_id = request.request_id.ok_or_else(|| {
            RequestError::InvalidRequest("request id missing from request event".to_string())
        })?;
        let response_name = request.event_name.response().ok_or_else(|| {
            RequestError::InvalidRequest(format!(
                "no response event is paired with {}",
                request.event_name
            ))
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            request_id,
            PendingRequest {
                sender: tx,
                request_name: request.event_name.clone(),
            },
        );
        self.install_dispatcher(&response_name);
        self.event_bus.publish(request).await?;

        self.await_response(request_id, self.default_timeout, rx).await
    }

    /// Like [`RequestManager::request`], but unwraps the response envelope:
    /// a success payload is returned as-is, an error envelope becomes
    /// [`RequestError::Rejected`] carrying the responder's code and message.
    pub async fn request_payload(&self, request: Event) -> RequestResult<Value> {
        let response = self.request(request).await?;
        response
            .data
            .into_result()
            .map_err(|err| RequestError::Rejected(AppError::from(err)))
    }

    /// Registers the responder for a request event.
    ///
    /// The handler receives the request event and returns the success payload
    /// or an [`AppError`]; either way a response is published on the paired
    /// name with the request's correlation id, so a failing handler can never
    /// leave the coordinator waiting. Registration is idempotent: any
    /// previously registered responder for the same name is removed first.
    pub fn respond<F, Fut>(&self, request_name: EventName, handler: F) -> RequestResult<()>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, AppError>> + Send + 'static,
    {
        let response_name = request_name.response().ok_or_else(|| {
            RequestError::InvalidRequest(format!(
                "no response event is paired with {request_name}"
            ))
        })?;
        let bus = self.event_bus.clone();
        let handler = Arc::new(handler);

        self.event_bus.remove_listeners(&request_name);
        self.event_bus.subscribe_fn(request_name, move |event: Event| {
            let bus = bus.clone();
            let handler = handler.clone();
            let response_name = response_name.clone();
            async move {
                let request_id = event.request_id;
                let mut builder = Event::response_builder().event_name(response_name);
                if let Some(id) = request_id {
                    builder = builder.request_id(id);
                }
                builder = match handler(event).await {
                    Ok(value) => builder.success().response(&value),
                    Err(err) => {
                        warn!(code = err.code, message = %err.message, "responder failed");
                        builder.failure().error(err.code, err.message)
                    }
                };
                match builder.build() {
                    Ok(response) => {
                        if let Err(e) = bus.publish(response).await {
                            warn!(error = %e, "failed to publish response event");
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to build response event"),
                }
            }
        });
        Ok(())
    }

    /// Fails every pending request with a cancellation error envelope.
    /// Returns how many were cancelled. Used at shutdown so no caller is left
    /// waiting on a responder that will never run again.
    pub async fn cancel_pending(&self, reason: &str) -> usize {
        let request_ids: Vec<RequestId> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut cancelled = 0;
        for request_id in request_ids {
            let Some((_, waiting)) = self.pending.remove(&request_id) else {
                continue;
            };
            let Some(response_name) = waiting.request_name.response() else {
                continue;
            };
            if let Ok(response) = Event::response_builder()
                .failure()
                .event_name(response_name)
                .request_id(request_id)
                .error(503, format!("request cancelled: {reason}"))
                .build()
            {
                let _ = waiting.sender.send(response);
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Installs the single response dispatcher for `response_name`.
    ///
    /// remove-then-subscribe bounds the listener count at exactly one no
    /// matter how many times a coordinator has run in the process lifetime.
    /// The dispatcher resolves by correlation id, so it is shared safely by
    /// concurrent requests on the same operation.
    fn install_dispatcher(&self, response_name: &EventName) {
        self.event_bus.remove_listeners(response_name);
        let pending = self.pending.clone();
        self.event_bus.subscribe_fn(response_name.clone(), move |event: Event| {
            let pending = pending.clone();
            async move {
                let Some(request_id) = event.request_id else {
                    warn!(event_name = %event.event_name, "response event without request id");
                    return;
                };
                if let Some((_, waiting)) = pending.remove(&request_id) {
                    let _ = waiting.sender.send(event);
                }
            }
        });
    }

    #[instrument(skip(self, rx))]
    async fn await_response(
        &self,
        request_id: RequestId,
        timeout: Duration,
        rx: oneshot::Receiver<Event>,
    ) -> RequestResult<Event> {
        let sleep = tokio::time::sleep(timeout);
        tokio::pin!(sleep);

        tokio::select! {
            _ = &mut sleep => {
                self.pending.remove(&request_id);
                Err(RequestError::Timeout(request_id))
            }
            result = rx => {
                result.map_err(|_| RequestError::ChannelClosed)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request timed out: {0}")]
    Timeout(RequestId),
    #[error("Response channel closed")]
    ChannelClosed,
    #[error("Event bus error: {0}")]
    Event(#[from] EventError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Request rejected by responder: {0}")]
    Rejected(AppError),
}

pub type RequestResult<T> = Result<T, RequestError>;

//! # Event-Driven Module Coordination
//!
//! The simkeu backend is a set of CRUD modules (salary, fund usage, balance
//! sheet, enrollment, billing) that occasionally need data or side effects
//! owned by another module. The event system lets them cooperate without
//! sharing repositories or compile-time dependencies.
//!
//! ## Architecture Overview
//!
//! - **EventBus**: routes published events to the listeners registered for
//!   their name
//! - **ListenerRegistry**: ordered subscriber lists per event name
//! - **RequestManager**: request-response pattern with correlation ids and
//!   timeout handling
//!
//! ## Event Flow
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │Publisher │────▶│ EventBus │────▶│Subscriber│
//! └──────────┘     └──────────┘     └──────────┘
//! ```
//!
//! ## Request-Response Pattern
//!
//! A coordinator publishes a `...Requested` event and awaits the paired
//! response event; the responding module's handler does the cross-module work
//! and publishes the result — a success payload or the structured
//! `{status, code, message}` error envelope:
//!
//! ```text
//! ┌───────────┐     ┌──────────┐     ┌──────────┐
//! │Coordinator│────▶│ EventBus │────▶│Responder │
//! └─────┬─────┘     └──────────┘     └────┬─────┘
//!       │                                 │
//!       │        Retrieved/Deleted        │
//!       └─────────────────────────────────┘
//! ```
//!
//! `publish` never awaits handler completion; the responder signals
//! completion by publishing the response event the coordinator is awaiting.

pub mod event_bus;
pub mod request_manager;

//! Domain-event contract, dispatch envelope, and event-sink abstraction.
//!
//! Aggregates collect typed event records in an append-only list; after a
//! successful save the caller drains that list, wraps each record in an
//! [`EventEnvelope`], and publishes it through an [`EventSink`] for
//! downstream consumers (notifications, audit logging).

pub mod envelope;
pub mod event;
pub mod in_memory_sink;
pub mod sink;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_sink::{InMemoryEventSink, InMemorySinkError};
pub use sink::{EventSink, Subscription};

//! Event sink abstraction (mechanics only).
//!
//! A sink receives domain events *after* they have been persisted with the
//! aggregate; it distributes them to downstream consumers (notification
//! senders, audit loggers). Delivery is at-least-once - consumers must be
//! idempotent - and the sink never participates in the domain decision
//! itself: if publication fails, the events are still recorded with the
//! aggregate and can be re-published.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a sink's event stream.
///
/// Each subscription gets a copy of every event published to the sink
/// (broadcast semantics). Subscriptions are designed for single-threaded
/// consumption; events arrive in publication order per publisher.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic event sink (pub/sub abstraction).
///
/// Transport-agnostic: works with in-memory channels for tests/dev and can
/// be backed by a message broker in a real deployment. Implementations must
/// be safe to share across threads; `publish` failures are surfaced to the
/// caller, which may retry (events are already persisted, so a retry can at
/// worst duplicate delivery).
pub trait EventSink<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, S> EventSink<M> for Arc<S>
where
    S: EventSink<M> + ?Sized,
{
    type Error = S::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}

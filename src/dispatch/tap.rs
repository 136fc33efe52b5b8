//! # Event taps: observable side channels.
//!
//! [`EventTap`] is a thin wrapper around [`tokio::sync::broadcast`] exposing a
//! lazy, infinite sequence of `(topic, Event)` pairs. Each subscriber carries
//! two taps:
//!
//! - the **inbound tap** — every event the subscriber receives, independent of
//!   dispatch outcome (audit channel),
//! - the **unhandled tap** — events that matched no registered pattern,
//!   letting ops tooling monitor truly unroutable traffic.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or suspends.
//! - **Fire-and-forget**: without active observers the pair is dropped.
//! - **Bounded capacity**: lagging observers see `RecvError::Lagged(n)` and
//!   skip the `n` oldest pairs.

use tokio::sync::broadcast;

use crate::event::Event;

/// Broadcast channel for `(topic, Event)` pairs.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); every observer
/// gets its own independent receiver.
#[derive(Clone, Debug)]
pub struct EventTap {
    tx: broadcast::Sender<(String, Event)>,
}

impl EventTap {
    /// Creates a tap with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes a pair to all active observers.
    ///
    /// Returns immediately; without observers the pair is dropped.
    pub fn publish(&self, topic: &str, event: &Event) {
        let _ = self.tx.send((topic.to_owned(), event.clone()));
    }

    /// Creates a new observer that sees subsequent pairs.
    ///
    /// A receiver only gets pairs sent after it was created; slow observers
    /// get `RecvError::Lagged(n)` and skip over missed items.
    pub fn observe(&self) -> broadcast::Receiver<(String, Event)> {
        self.tx.subscribe()
    }
}

//! # In-process broker.
//!
//! [`LocalBus`] is a broadcast channel of `(topic, Envelope)` pairs shared by
//! every local transport attached to it. It exists for tests, examples and
//! single-process wiring; it still moves *encoded* envelopes, so payload
//! types cross it exactly the way they would cross a real broker.
//!
//! ## Rules
//! - **Fire-and-forget**: with no attached subscriber the envelope is dropped.
//! - **Bounded**: a lagging subscriber transport skips the oldest envelopes.
//! - **Topic filtering happens in the subscribe transport**, not here; the
//!   bus itself delivers every envelope to every attached receiver.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::event::Envelope;

/// Default channel capacity for a local bus.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Shared in-process event channel.
///
/// Cheap to clone; clones refer to the same channel.
#[derive(Clone, Debug)]
pub struct LocalBus {
    tx: broadcast::Sender<(Arc<str>, Envelope)>,
}

impl LocalBus {
    /// Creates a bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Injects one envelope onto the bus.
    ///
    /// Never blocks; without attached receivers the envelope is dropped.
    pub(crate) fn send(&self, topic: &str, envelope: Envelope) {
        let _ = self.tx.send((Arc::from(topic), envelope));
    }

    /// Attaches a new receiver that sees subsequent envelopes.
    pub(crate) fn attach(&self) -> broadcast::Receiver<(Arc<str>, Envelope)> {
        self.tx.subscribe()
    }

    /// Number of currently attached receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[tokio::test]
    async fn attached_receiver_sees_envelopes() {
        let bus = LocalBus::new(8);
        let mut rx = bus.attach();

        let registry = crate::event::PayloadRegistry::shared();
        let envelope = Envelope::from_event(&Event::new("p", None), &registry)
            .await
            .unwrap();
        bus.send("alerts", envelope.clone());

        let (topic, received) = rx.recv().await.unwrap();
        assert_eq!(&*topic, "alerts");
        assert_eq!(received, envelope);
    }

    #[tokio::test]
    async fn send_without_receivers_is_dropped() {
        let bus = LocalBus::new(8);
        assert_eq!(bus.receiver_count(), 0);

        let registry = crate::event::PayloadRegistry::shared();
        let envelope = Envelope::from_event(&Event::new("p", None), &registry)
            .await
            .unwrap();
        bus.send("alerts", envelope);

        let mut rx = bus.attach();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}

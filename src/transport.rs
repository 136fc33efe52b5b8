//! # Transport adapter contracts.
//!
//! The core is transport-agnostic: it only ever hands an [`Envelope`] to an
//! adapter and only ever receives envelopes from one. Wire-level framing,
//! retries, durability and broker-specific semantics all live behind these
//! two traits.
//!
//! The crate ships one reference implementation, the in-memory
//! [`LocalBus`](crate::LocalBus) transports; external adapters (MQTT, Kafka,
//! ...) implement the same contracts in their own crates.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::TransportError;
use crate::event::Envelope;

/// Outbound side of a transport: carries envelopes to the wire.
#[async_trait]
pub trait PublishTransport: Send + Sync + 'static {
    /// Establishes the transport connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tears the transport connection down.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Sends one envelope on a topic.
    async fn send(&self, topic: &str, envelope: Envelope) -> Result<(), TransportError>;
}

/// Inbound side of a transport: delivers envelopes from the wire.
#[async_trait]
pub trait SubscribeTransport: Send + Sync + 'static {
    /// Establishes the transport connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tears the transport connection down.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Registers interest in a topic with the broker.
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// Withdraws interest in a topic (`None` = all topics).
    async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), TransportError>;

    /// Returns a fresh, infinite stream of inbound `(topic, Envelope)` pairs.
    ///
    /// The stream ends only when the transport shuts down; it is restartable
    /// only via a fresh `connect()`.
    fn incoming(&self) -> BoxStream<'static, (String, Envelope)>;
}

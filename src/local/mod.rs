//! # In-process transport.
//!
//! A complete, broker-free rendition of the transport contracts, backed by a
//! shared broadcast channel. Useful for tests and single-process wiring, and
//! as the reference adapter implementation.

pub mod bus;
pub mod transport;

use std::sync::Arc;

pub use bus::{LocalBus, DEFAULT_BUS_CAPACITY};
pub use transport::{LocalPublishTransport, LocalSubscribeTransport};

use crate::client::{PubSubClient, Publisher, Subscriber};
use crate::event::PayloadRegistry;

/// Combined client over the in-process bus.
pub type LocalClient = PubSubClient<LocalPublishTransport, LocalSubscribeTransport>;

/// Builds a combined client attached to `bus`, with default configuration.
///
/// Both halves share `registry`, so payload types registered on one side are
/// decodable on the other.
pub fn local_client(bus: &LocalBus, registry: Arc<PayloadRegistry>) -> LocalClient {
    let publisher = Publisher::new(LocalPublishTransport::new(bus), Arc::clone(&registry));
    let subscriber = Subscriber::new(LocalSubscribeTransport::new(bus), registry);
    PubSubClient::new(publisher, subscriber)
}

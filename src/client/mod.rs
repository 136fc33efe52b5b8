//! # Client surfaces.
//!
//! - `connector`: shared connection state machine.
//! - `publisher`: outbound client with hooks and multi-topic fan-out.
//! - `subscriber`: inbound client with the dispatch engine and taps.
//! - `pubsub`: combined and type-erased client surfaces.

pub mod connector;
pub mod publisher;
pub mod pubsub;
pub mod subscriber;

pub use connector::ConnectionState;
pub use publisher::{PublishHooks, Publisher, PublisherBuilder};
pub use pubsub::{Client, MultiClient, PubSubClient};
pub use subscriber::{SubscribeHooks, Subscriber, SubscriberBuilder};

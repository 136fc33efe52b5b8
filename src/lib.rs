//! # omnibus
//!
//! **Omnibus** is a transport-agnostic async publish/subscribe client
//! library for Rust.
//!
//! It provides typed event payloads, a wire-neutral envelope, pattern-based
//! handler dispatch with failure isolation, and pluggable transport
//! adapters. The crate is designed as a building block for event-driven
//! services that need to swap brokers without touching application code.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌─────────────────────────┐            ┌──────────────────────────────┐
//!  │  Publisher              │            │  Subscriber                  │
//!  │  - identity + state     │            │  - identity + state          │
//!  │  - PublishHooks         │            │  - SubscribeHooks            │
//!  │  - multi-topic fan-out  │            │  - receive loop (spawned)    │
//!  └──────────┬──────────────┘            └──────────────▲───────────────┘
//!             │ Event ─► Envelope                        │ Envelope ─► Event
//!             │ (PayloadRegistry encodes)                │ (PayloadRegistry decodes)
//!             ▼                                          │
//!  ┌─────────────────────────┐            ┌──────────────┴───────────────┐
//!  │  PublishTransport       │            │  SubscribeTransport          │
//!  │  (adapter trait)        │            │  (adapter trait)             │
//!  └──────────┬──────────────┘            └──────────────▲───────────────┘
//!             ▼                                          │
//!  ═══════════╪══════════════ wire / broker ═════════════╪═══════════════
//!                     (LocalBus ships as the in-process rendition)
//!
//!  Inside the subscriber, per inbound (topic, Event):
//!
//!      inbound tap ◄── every event, pre-dispatch (audit)
//!          │
//!      Dispatcher ──► match topic against patterns (TopicMatcher)
//!          │             │
//!          │             ├─ no match ────► unhandled tap
//!          │             └─ per binding ─► handler │ fallback │ skip
//!          │
//!      fan-out: Concurrent (join barrier) or Ordered (registration order),
//!      errors and panics isolated per handler, aggregated in DispatchError
//! ```
//!
//! ### Event lifecycle
//! ```text
//! publish(topic, payload)
//!   ─► Event { identifier, publisher, timestamp, payload }
//!   ─► on_publishing ─► Envelope (encoded) ─► transport.send ─► on_published
//!
//! transport.incoming()
//!   ─► Envelope ─► decode via registry ─► inbound tap ─► dispatch ─► handlers
//! ```
//!
//! ## Rules
//! - Publishers and subscribers are **identity-carrying**: every event
//!   records who produced it.
//! - `connect`/`disconnect` are **idempotent**; operations outside the
//!   connected state fail with [`ClientError::NotConnected`] before any
//!   transport call.
//! - Handler failures are **isolated**: an erroring or panicking handler
//!   never affects siblings, other events, or the receive loop.
//! - Undecodable inbound envelopes are **logged and skipped**, never fatal.
//! - Hooks run around transport actions; a failing *before* hook vetoes the
//!   action, a failing action skips the *after* hook.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//!
//! use omnibus::{
//!     local_client, sync_handler, LocalBus, PayloadCodec, PayloadRegistry, Utf8Payload,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), omnibus::ClientError> {
//! let bus = LocalBus::default();
//! let registry = PayloadRegistry::shared();
//! registry.register_of::<Utf8Payload>().await;
//!
//! let client = local_client(&bus, Arc::clone(&registry));
//! client.connect().await?;
//!
//! client
//!     .subscribe("greetings", Some(sync_handler("print", |_topic, event| {
//!         if let Some(text) = event.payload_as::<Utf8Payload>() {
//!             println!("{}", text.0);
//!         }
//!         Ok(())
//!     })))
//!     .await?;
//!
//! client
//!     .publish("greetings", Some(Utf8Payload::from("hello").into_payload()))
//!     .await?;
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod local;
pub mod transport;

pub use client::{
    Client, ConnectionState, MultiClient, PubSubClient, PublishHooks, Publisher, PublisherBuilder,
    SubscribeHooks, Subscriber, SubscriberBuilder,
};
pub use config::{ClientConfig, DispatchMode};
pub use dispatch::{Dispatcher, EventTap, ExactMatcher, GlobMatcher, MatcherRef, TopicMatcher};
pub use error::{
    ClientError, CodecError, DispatchError, HandlerError, HandlerFailure, TransportError,
};
pub use event::{
    EncodedPayload, Envelope, Event, Float32Payload, Float64Payload, Int32Payload, Int64Payload,
    Json, Payload, PayloadCodec, PayloadRef, PayloadRegistry, PayloadType, Utf8Payload,
};
pub use handler::{Handle, HandlerFn, HandlerRef, SchemaHandle, SchemaHandlerFn, sync_handler};
pub use local::{
    local_client, LocalBus, LocalClient, LocalPublishTransport, LocalSubscribeTransport,
    DEFAULT_BUS_CAPACITY,
};
pub use transport::{PublishTransport, SubscribeTransport};

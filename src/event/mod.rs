//! # Events, payloads and their wire form.
//!
//! This module groups everything about what travels through the bus:
//!
//! - `payload`: the [`PayloadCodec`]/[`Payload`] traits for typed payloads.
//! - `registry`: the shared tag → decoder mapping ([`PayloadRegistry`]).
//! - `event`: the in-memory [`Event`] record.
//! - `envelope`: the serialized [`Envelope`] crossing transport boundaries.
//! - `messages`: built-in payload types (raw numerics, UTF-8, JSON).

pub mod envelope;
#[allow(clippy::module_inception)]
pub mod event;
pub mod messages;
pub mod payload;
pub mod registry;

pub use envelope::Envelope;
pub use event::Event;
pub use messages::{
    Float32Payload, Float64Payload, Int32Payload, Int64Payload, Json, Utf8Payload, FLOAT32_FORMAT,
    FLOAT64_FORMAT, INT32_FORMAT, INT64_FORMAT, JSON_FORMAT, UTF8_FORMAT,
};
pub use payload::{EncodedPayload, Payload, PayloadCodec, PayloadRef};
pub use registry::{PayloadRegistry, PayloadType};

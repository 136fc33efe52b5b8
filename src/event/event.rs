//! # The event record.
//!
//! An [`Event`] is one occurrence: an opaque identifier, the identity of the
//! producing publisher, a creation timestamp, and an optional typed payload.
//! Payload-less events are pure signals.
//!
//! Events are immutable values once constructed — the identifier never
//! changes, and the struct is cheap to clone (the payload sits behind an
//! `Arc`), so it can be passed freely between tasks without locking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::payload::{PayloadCodec, PayloadRef};

/// One occurrence published on a topic.
///
/// Built by [`Publisher::publish`](crate::Publisher::publish) (which generates
/// the identifier and timestamp) and handed to handlers on the subscribing
/// side after envelope decoding.
///
/// # Example
/// ```
/// use omnibus::{Event, Int64Payload, PayloadCodec};
///
/// let event = Event::new("sensor-1", Some(Int64Payload(42).into_payload()));
/// assert!(!event.identifier().is_empty());
/// assert_eq!(event.payload_as::<Int64Payload>(), Some(&Int64Payload(42)));
/// ```
#[derive(Debug, Clone)]
pub struct Event {
    identifier: String,
    publisher: String,
    timestamp: DateTime<Utc>,
    payload: Option<PayloadRef>,
}

impl Event {
    /// Creates a new event with a generated identifier and current timestamp.
    pub fn new(publisher: impl Into<String>, payload: Option<PayloadRef>) -> Self {
        Self {
            identifier: Uuid::new_v4().to_string(),
            publisher: publisher.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Rebuilds an event from its recorded parts (envelope decoding).
    pub(crate) fn reconstruct(
        identifier: String,
        publisher: String,
        timestamp: DateTime<Utc>,
        payload: Option<PayloadRef>,
    ) -> Self {
        Self {
            identifier,
            publisher,
            timestamp,
            payload,
        }
    }

    /// Opaque unique identifier, immutable once assigned.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Identity of the producing publisher.
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// Creation timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The typed payload, if any.
    pub fn payload(&self) -> Option<&PayloadRef> {
        self.payload.as_ref()
    }

    /// Downcasts the payload to a concrete type.
    ///
    /// Returns `None` for signal events and for payloads of a different type.
    pub fn payload_as<T: PayloadCodec>(&self) -> Option<&T> {
        self.payload.as_ref()?.as_any().downcast_ref::<T>()
    }

    /// True when the event carries no payload.
    pub fn is_signal(&self) -> bool {
        self.payload.is_none()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        if self.identifier != other.identifier
            || self.publisher != other.publisher
            || self.timestamp != other.timestamp
        {
            return false;
        }
        match (&self.payload, &other.payload) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

//! # Envelope: the wire form of an event.
//!
//! An [`Envelope`] is the self-describing, transport-neutral serialization of
//! an [`Event`]: next to the serialized payload bytes it carries the payload's
//! type tag and format tag, so the receiving side can reconstruct the original
//! typed value without statically knowing the type.
//!
//! ## Invariant
//! `payload_type`, `payload_format` and `payload` are all present or all
//! absent. An envelope never carries bytes it cannot attribute to a type, and
//! never a type tag for an absent payload. The invariant is enforced
//! structurally: envelopes are built only by [`Envelope::from_event`] or
//! [`Envelope::from_bytes`] (which validates).
//!
//! ## Lifecycle
//! Built from an event immediately before transport hand-off; discarded once
//! decoded back into an event on the receiving side.
//!
//! Encoding has one deliberate side effect: the payload's type descriptor is
//! auto-registered in the registry when unseen, so a process that only ever
//! publishes a type can still decode its own loopback traffic.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::event::event::Event;
use crate::event::registry::PayloadRegistry;

/// Serialized, transport-neutral form of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    identifier: String,
    publisher: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Bytes>,
}

impl Envelope {
    /// Serializes an event into its wire form.
    ///
    /// The payload serializes itself (see
    /// [`PayloadCodec::encode`](crate::PayloadCodec::encode)); its type
    /// descriptor is registered in `registry` when unseen.
    pub async fn from_event(event: &Event, registry: &PayloadRegistry) -> Result<Self, CodecError> {
        let (payload_type, payload_format, payload) = match event.payload() {
            Some(p) => {
                registry.ensure(p.descriptor()).await;
                let encoded = p.encode(None)?;
                (
                    Some(p.type_tag().into_owned()),
                    Some(encoded.format.into_owned()),
                    Some(encoded.bytes),
                )
            }
            None => (None, None, None),
        };

        Ok(Self {
            identifier: event.identifier().to_owned(),
            publisher: event.publisher().to_owned(),
            timestamp: event.timestamp(),
            payload_type,
            payload_format,
            payload,
        })
    }

    /// Reconstructs the event, resolving the payload type through `registry`.
    ///
    /// Fails with [`CodecError::UnknownPayloadType`] when the tag was never
    /// registered on this side — recoverable, surfaced to the caller.
    pub async fn into_event(self, registry: &PayloadRegistry) -> Result<Event, CodecError> {
        let payload = match (self.payload_type, self.payload_format, self.payload) {
            (Some(tag), Some(format), Some(bytes)) => {
                let ty = registry.resolve(&tag).await?;
                Some(ty.decode(&format, &bytes)?)
            }
            (None, None, None) => None,
            _ => {
                return Err(CodecError::MalformedEnvelope {
                    detail: "payload type, format and bytes must be all present or all absent"
                        .to_owned(),
                })
            }
        };

        Ok(Event::reconstruct(
            self.identifier,
            self.publisher,
            self.timestamp,
            payload,
        ))
    }

    /// Encodes the envelope as JSON bytes for wire-level framing.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|err| CodecError::Encode {
                detail: err.to_string(),
            })
    }

    /// Decodes an envelope from JSON bytes, validating the payload-field invariant.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|err| CodecError::Decode {
                detail: err.to_string(),
            })?;
        envelope.check_payload_fields()?;
        Ok(envelope)
    }

    /// Event identifier recorded in the envelope.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Identity of the producing publisher.
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// Creation timestamp of the original event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Type tag of the serialized payload, if any.
    pub fn payload_type(&self) -> Option<&str> {
        self.payload_type.as_deref()
    }

    /// Format tag of the serialized payload, if any.
    pub fn payload_format(&self) -> Option<&str> {
        self.payload_format.as_deref()
    }

    /// The serialized payload bytes, if any.
    pub fn payload_bytes(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    fn check_payload_fields(&self) -> Result<(), CodecError> {
        let present = [
            self.payload_type.is_some(),
            self.payload_format.is_some(),
            self.payload.is_some(),
        ];
        if present.iter().all(|p| *p) || present.iter().all(|p| !*p) {
            Ok(())
        } else {
            Err(CodecError::MalformedEnvelope {
                detail: "payload type, format and bytes must be all present or all absent"
                    .to_owned(),
            })
        }
    }
}

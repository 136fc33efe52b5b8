//! Error types used across the pub/sub client.
//!
//! This module defines the full error taxonomy:
//!
//! - [`CodecError`] — payload/envelope (de)serialization failures.
//! - [`TransportError`] — opaque failures reported by transport adapters.
//! - [`HandlerError`] — a failure from a single event handler.
//! - [`DispatchError`] — aggregate of isolated handler failures for one dispatch.
//! - [`ClientError`] — everything a publisher/subscriber operation can return.
//!
//! Error types provide `as_label()` returning a short stable snake_case label
//! for logs and metrics.

use std::fmt;

use thiserror::Error;

/// Errors produced while encoding or decoding payloads and envelopes.
///
/// These are recoverable: they are surfaced to the caller of the codec
/// operation and never abort the process or the receive loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CodecError {
    /// Deserialization was requested for a type tag the registry has never seen.
    #[error("unknown payload type tag '{tag}'")]
    UnknownPayloadType {
        /// The unresolved type tag carried by the envelope.
        tag: String,
    },

    /// A payload decoder was handed bytes in a format it does not speak.
    #[error("payload format mismatch: expected '{expected}', found '{found}'")]
    FormatMismatch {
        /// Format the decoder supports.
        expected: String,
        /// Format tag found on the wire.
        found: String,
    },

    /// Envelope violates its structural invariant (e.g. a type tag without bytes).
    #[error("malformed envelope: {detail}")]
    MalformedEnvelope {
        /// Human-readable description of the violation.
        detail: String,
    },

    /// Payload serialization failed.
    #[error("payload encoding failed: {detail}")]
    Encode {
        /// Underlying error message.
        detail: String,
    },

    /// Payload deserialization failed.
    #[error("payload decoding failed: {detail}")]
    Decode {
        /// Underlying error message.
        detail: String,
    },
}

impl CodecError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use omnibus::CodecError;
    ///
    /// let err = CodecError::UnknownPayloadType { tag: "Order".into() };
    /// assert_eq!(err.as_label(), "codec_unknown_payload_type");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CodecError::UnknownPayloadType { .. } => "codec_unknown_payload_type",
            CodecError::FormatMismatch { .. } => "codec_format_mismatch",
            CodecError::MalformedEnvelope { .. } => "codec_malformed_envelope",
            CodecError::Encode { .. } => "codec_encode",
            CodecError::Decode { .. } => "codec_decode",
        }
    }
}

/// Opaque error reported by a transport adapter.
///
/// The core never inspects transport failures; whatever the adapter reports
/// is carried through unchanged as a message.
#[derive(Error, Debug)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a transport error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a transport error from any displayable source error.
    pub fn from_err(err: impl fmt::Display) -> Self {
        Self {
            message: err.to_string(),
        }
    }

    /// Returns the adapter-supplied message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TransportError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for TransportError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

/// Failure returned by a single event handler invocation.
#[derive(Error, Debug)]
#[error("handler failed: {message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a handler error from any displayable source error.
    pub fn from_err(err: impl fmt::Display) -> Self {
        Self {
            message: err.to_string(),
        }
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

/// One failed handler within a dispatch fan-out.
#[derive(Error, Debug)]
#[error("handler '{handler}' (pattern '{pattern}'): {error}")]
pub struct HandlerFailure {
    /// Name of the failed handler.
    pub handler: String,
    /// Topic pattern the handler was bound to.
    pub pattern: String,
    /// The underlying handler error.
    #[source]
    pub error: HandlerError,
}

/// Aggregate of handler failures collected during one dispatch.
///
/// Handler failures are isolated: one failure never prevents sibling handlers
/// from running, and none is silently dropped. The dispatch call reports all
/// of them here.
#[derive(Error, Debug)]
#[error("{n} handler(s) failed during dispatch", n = .failures.len())]
pub struct DispatchError {
    /// All failures observed during the fan-out, in completion order for
    /// concurrent dispatch and in registration order for ordered dispatch.
    pub failures: Vec<HandlerFailure>,
}

/// Errors produced by publisher/subscriber operations.
///
/// Every public client operation either completes with its declared result or
/// fails with exactly one of these kinds. The core never retries internally;
/// retry/backoff belongs to the transport or the application.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// An operation requiring an active connection was invoked outside the
    /// `Connected` state. No transport call was attempted.
    #[error("connector '{connector}' is not connected")]
    NotConnected {
        /// Identifier of the publisher/subscriber.
        connector: String,
    },

    /// A subscribe call required a handler and none (direct or fallback) was available.
    #[error("no handler (direct or fallback) available for topic '{topic}'")]
    HandlerNotFound {
        /// The topic being subscribed.
        topic: String,
    },

    /// Payload or envelope codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Failure reported by the transport adapter, propagated unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// One or more handlers failed during dispatch.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A spawned fan-out task could not be joined (e.g. it panicked).
    #[error("fan-out task failed: {reason}")]
    Fanout {
        /// Join failure description.
        reason: String,
    },
}

impl ClientError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use omnibus::ClientError;
    ///
    /// let err = ClientError::NotConnected { connector: "pub-1".into() };
    /// assert_eq!(err.as_label(), "client_not_connected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::NotConnected { .. } => "client_not_connected",
            ClientError::HandlerNotFound { .. } => "client_handler_not_found",
            ClientError::Codec(_) => "client_codec",
            ClientError::Transport(_) => "client_transport",
            ClientError::Dispatch(_) => "client_dispatch",
            ClientError::Fanout { .. } => "client_fanout",
        }
    }
}

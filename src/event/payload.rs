//! # Typed event payloads.
//!
//! A payload is an application-defined value carried inside an [`Event`](crate::Event).
//! Two traits split the concern:
//!
//! - [`PayloadCodec`] — implemented by applications. Sized, with a static
//!   `decode` constructor, so a payload type can be rebuilt from bytes.
//! - [`Payload`] — object-safe view, blanket-implemented for every
//!   `PayloadCodec`. This is what events and envelopes actually carry
//!   (as [`PayloadRef`], an `Arc<dyn Payload>`).
//!
//! ## Type tags
//! [`PayloadCodec::type_tag`] defaults to the type's short name (the last path
//! segment of `std::any::type_name`), so sender and receiver agree on the tag
//! without coordination. Override it when the default would collide.
//!
//! ## Round-trip invariant
//! `T::decode(format, encode(v).bytes) == v` for every supported format.
//!
//! ## Example
//! ```
//! use bytes::Bytes;
//! use omnibus::{CodecError, EncodedPayload, PayloadCodec};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Ping(u8);
//!
//! impl PayloadCodec for Ping {
//!     fn encode(&self, _hint: Option<&str>) -> Result<EncodedPayload, CodecError> {
//!         Ok(EncodedPayload::new("raw", Bytes::copy_from_slice(&[self.0])))
//!     }
//!
//!     fn decode(_format: &str, bytes: &[u8]) -> Result<Self, CodecError> {
//!         Ok(Ping(bytes.first().copied().unwrap_or(0)))
//!     }
//! }
//!
//! assert_eq!(Ping::type_tag(), "Ping");
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::CodecError;
use crate::event::registry::PayloadType;

/// Shared handle to a type-erased payload.
pub type PayloadRef = Arc<dyn Payload>;

/// A serialized payload: the format tag plus the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Format tag (e.g. `"int64"`, `"utf8"`, `"json"`), stored on the wire
    /// next to the bytes so the receiving side knows how to decode them.
    pub format: Cow<'static, str>,
    /// The serialized bytes.
    pub bytes: Bytes,
}

impl EncodedPayload {
    /// Creates an encoded payload from a format tag and bytes.
    pub fn new(format: impl Into<Cow<'static, str>>, bytes: Bytes) -> Self {
        Self {
            format: format.into(),
            bytes,
        }
    }
}

/// Serialization contract implemented by application payload types.
///
/// `decode` is a static constructor keyed by the concrete type; the
/// [registry](crate::PayloadRegistry) stores a type-erased pointer to it so a
/// receiver can rebuild the payload without statically knowing the type.
pub trait PayloadCodec: PartialEq + fmt::Debug + Send + Sync + Sized + 'static {
    /// Stable tag identifying this payload type on the wire.
    ///
    /// Defaults to the type's short name, which is deterministic for both
    /// sides of a connection built from the same types.
    fn type_tag() -> Cow<'static, str> {
        Cow::Borrowed(short_type_name(std::any::type_name::<Self>()))
    }

    /// Serializes the payload, choosing (or honoring) a format.
    ///
    /// `hint` is a caller-supplied format preference; implementations that
    /// support a single format may ignore it.
    fn encode(&self, hint: Option<&str>) -> Result<EncodedPayload, CodecError>;

    /// Reconstructs a payload from its format tag and bytes.
    fn decode(format: &str, bytes: &[u8]) -> Result<Self, CodecError>;

    /// Wraps the value into a shared type-erased handle, ready to be attached
    /// to an [`Event`](crate::Event).
    fn into_payload(self) -> PayloadRef {
        Arc::new(self)
    }
}

/// Object-safe payload view carried by events and envelopes.
///
/// Blanket-implemented for every [`PayloadCodec`]; there is no reason to
/// implement it by hand.
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    /// Stable type tag of the concrete payload type.
    fn type_tag(&self) -> Cow<'static, str>;

    /// Serializes this payload (see [`PayloadCodec::encode`]).
    fn encode(&self, hint: Option<&str>) -> Result<EncodedPayload, CodecError>;

    /// Returns the registry descriptor for the concrete type, enough to
    /// invoke its `decode` on the receiving side.
    fn descriptor(&self) -> PayloadType;

    /// Upcast for downcasting back to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Equality across type-erased payloads (false when types differ).
    fn eq_dyn(&self, other: &dyn Payload) -> bool;
}

impl<T: PayloadCodec> Payload for T {
    fn type_tag(&self) -> Cow<'static, str> {
        T::type_tag()
    }

    fn encode(&self, hint: Option<&str>) -> Result<EncodedPayload, CodecError> {
        <T as PayloadCodec>::encode(self, hint)
    }

    fn descriptor(&self) -> PayloadType {
        PayloadType::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn Payload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Strips module paths (but not generic arguments) from a type name.
pub(crate) fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    let start = head.rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

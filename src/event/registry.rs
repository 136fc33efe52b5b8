//! # Payload type registry.
//!
//! [`PayloadRegistry`] maps stable type tags to [`PayloadType`] descriptors —
//! enough information to reconstruct a payload of that type from bytes.
//!
//! ## Rules
//! - **Explicit instance**: the registry is constructed and passed explicitly
//!   (usually one shared [`Arc`] per process, created at the application's top
//!   level). Library code never hides a global singleton, so tests can use
//!   isolated registries.
//! - **Last write wins**: at most one descriptor per tag; re-registering a tag
//!   replaces the previous mapping. This favors availability over strict
//!   schema governance.
//! - **Concurrent access**: publishers register during encode, subscribers
//!   resolve during decode, possibly at the same time; the map sits behind an
//!   async `RwLock`.
//!
//! Population is either explicit ([`PayloadRegistry::register_of`]) or
//! implicit: the first successful serialization of an unseen payload type
//! auto-registers it, covering the common case where only the sender knows
//! the payload type statically.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::CodecError;
use crate::event::payload::{PayloadCodec, PayloadRef};

/// Type-erased decode entry point for one payload type.
type DecodeFn = fn(&str, &[u8]) -> Result<PayloadRef, CodecError>;

fn decode_erased<T: PayloadCodec>(format: &str, bytes: &[u8]) -> Result<PayloadRef, CodecError> {
    Ok(Arc::new(T::decode(format, bytes)?))
}

/// Descriptor of a registered payload type: its tag and how to decode it.
#[derive(Debug, Clone)]
pub struct PayloadType {
    tag: String,
    decode: DecodeFn,
}

impl PayloadType {
    /// Builds the descriptor for a concrete payload type.
    ///
    /// # Example
    /// ```
    /// use omnibus::{Int64Payload, PayloadType};
    ///
    /// let ty = PayloadType::of::<Int64Payload>();
    /// assert_eq!(ty.tag(), "Int64Payload");
    /// ```
    pub fn of<T: PayloadCodec>() -> Self {
        Self {
            tag: T::type_tag().into_owned(),
            decode: decode_erased::<T>,
        }
    }

    /// Returns the stable type tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Decodes bytes into a payload of this type.
    pub fn decode(&self, format: &str, bytes: &[u8]) -> Result<PayloadRef, CodecError> {
        (self.decode)(format, bytes)
    }
}

/// Shared mapping from type tags to payload descriptors.
#[derive(Debug, Default)]
pub struct PayloadRegistry {
    types: RwLock<HashMap<String, PayloadType>>,
}

impl PayloadRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry already wrapped for sharing.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers a payload type descriptor under its tag.
    ///
    /// Re-registering an existing tag replaces the mapping (last write wins).
    pub async fn register(&self, ty: PayloadType) {
        let tag = ty.tag.clone();
        let replaced = self.types.write().await.insert(tag.clone(), ty);
        if replaced.is_some() {
            debug!(tag = %tag, "payload type re-registered; previous mapping replaced");
        }
    }

    /// Registers a concrete payload type by its own tag.
    pub async fn register_of<T: PayloadCodec>(&self) {
        self.register(PayloadType::of::<T>()).await;
    }

    /// Registers a descriptor only when its tag is unseen.
    ///
    /// Used by the envelope codec to auto-register on encode without churning
    /// existing mappings.
    pub async fn ensure(&self, ty: PayloadType) {
        let mut types = self.types.write().await;
        types.entry(ty.tag.clone()).or_insert(ty);
    }

    /// Looks up the descriptor for a tag.
    ///
    /// Fails with [`CodecError::UnknownPayloadType`] when the tag has never
    /// been registered — a recoverable error, surfaced to the decode caller.
    pub async fn resolve(&self, tag: &str) -> Result<PayloadType, CodecError> {
        self.types
            .read()
            .await
            .get(tag)
            .cloned()
            .ok_or_else(|| CodecError::UnknownPayloadType { tag: tag.to_owned() })
    }

    /// True when a descriptor is registered for the tag.
    pub async fn contains(&self, tag: &str) -> bool {
        self.types.read().await.contains_key(tag)
    }

    /// Number of registered payload types.
    pub async fn len(&self) -> usize {
        self.types.read().await.len()
    }

    /// True when no payload type is registered.
    pub async fn is_empty(&self) -> bool {
        self.types.read().await.is_empty()
    }
}

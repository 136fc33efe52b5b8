//! # Built-in payload types.
//!
//! Ready-made [`PayloadCodec`] implementations for common cases:
//!
//! - raw big-endian numerics ([`Int32Payload`], [`Int64Payload`],
//!   [`Float32Payload`], [`Float64Payload`]),
//! - UTF-8 text ([`Utf8Payload`]),
//! - [`Json<T>`] — wraps any `serde` value in a JSON-encoded payload.
//!
//! Each type owns exactly one wire format and rejects others with
//! [`CodecError::FormatMismatch`].

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::event::payload::{short_type_name, EncodedPayload, PayloadCodec};

/// Wire format tag for raw big-endian `i32`.
pub const INT32_FORMAT: &str = "int32";
/// Wire format tag for raw big-endian `i64`.
pub const INT64_FORMAT: &str = "int64";
/// Wire format tag for raw big-endian `f32`.
pub const FLOAT32_FORMAT: &str = "float32";
/// Wire format tag for raw big-endian `f64`.
pub const FLOAT64_FORMAT: &str = "float64";
/// Wire format tag for UTF-8 text.
pub const UTF8_FORMAT: &str = "utf8";
/// Wire format tag for JSON-encoded payloads.
pub const JSON_FORMAT: &str = "json";

fn expect_format(expected: &'static str, found: &str) -> Result<(), CodecError> {
    if found == expected {
        Ok(())
    } else {
        Err(CodecError::FormatMismatch {
            expected: expected.to_owned(),
            found: found.to_owned(),
        })
    }
}

fn fixed_bytes<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| CodecError::Decode {
        detail: format!("expected {N} bytes, got {}", bytes.len()),
    })
}

macro_rules! raw_number_payload {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $format:ident, $len:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name(pub $ty);

        impl PayloadCodec for $name {
            fn encode(&self, _hint: Option<&str>) -> Result<EncodedPayload, CodecError> {
                Ok(EncodedPayload::new(
                    $format,
                    Bytes::copy_from_slice(&self.0.to_be_bytes()),
                ))
            }

            fn decode(format: &str, bytes: &[u8]) -> Result<Self, CodecError> {
                expect_format($format, format)?;
                Ok(Self(<$ty>::from_be_bytes(fixed_bytes::<$len>(bytes)?)))
            }
        }
    };
}

raw_number_payload!(
    /// Raw `i32` payload, big-endian on the wire.
    Int32Payload, i32, INT32_FORMAT, 4
);
raw_number_payload!(
    /// Raw `i64` payload, big-endian on the wire.
    Int64Payload, i64, INT64_FORMAT, 8
);
raw_number_payload!(
    /// Raw `f32` payload, big-endian on the wire.
    Float32Payload, f32, FLOAT32_FORMAT, 4
);
raw_number_payload!(
    /// Raw `f64` payload, big-endian on the wire.
    Float64Payload, f64, FLOAT64_FORMAT, 8
);

/// UTF-8 text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utf8Payload(pub String);

impl PayloadCodec for Utf8Payload {
    fn encode(&self, _hint: Option<&str>) -> Result<EncodedPayload, CodecError> {
        Ok(EncodedPayload::new(
            UTF8_FORMAT,
            Bytes::copy_from_slice(self.0.as_bytes()),
        ))
    }

    fn decode(format: &str, bytes: &[u8]) -> Result<Self, CodecError> {
        expect_format(UTF8_FORMAT, format)?;
        let text = std::str::from_utf8(bytes).map_err(|err| CodecError::Decode {
            detail: err.to_string(),
        })?;
        Ok(Self(text.to_owned()))
    }
}

impl From<&str> for Utf8Payload {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// JSON-encoded payload wrapping any `serde` value.
///
/// The type tag embeds the inner type's short name, so `Json<OrderCreated>`
/// on the sender matches `Json<OrderCreated>` on the receiver.
///
/// # Example
/// ```
/// use omnibus::{Json, PayloadCodec};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct OrderCreated { order_id: u64 }
///
/// let payload = Json(OrderCreated { order_id: 7 });
/// let encoded = payload.encode(None).unwrap();
/// let decoded = Json::<OrderCreated>::decode(&encoded.format, &encoded.bytes).unwrap();
/// assert_eq!(decoded, payload);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> PayloadCodec for Json<T>
where
    T: Serialize + DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn type_tag() -> Cow<'static, str> {
        Cow::Owned(format!(
            "Json<{}>",
            short_type_name(std::any::type_name::<T>())
        ))
    }

    fn encode(&self, _hint: Option<&str>) -> Result<EncodedPayload, CodecError> {
        let bytes = serde_json::to_vec(&self.0).map_err(|err| CodecError::Encode {
            detail: err.to_string(),
        })?;
        Ok(EncodedPayload::new(JSON_FORMAT, Bytes::from(bytes)))
    }

    fn decode(format: &str, bytes: &[u8]) -> Result<Self, CodecError> {
        expect_format(JSON_FORMAT, format)?;
        let value = serde_json::from_slice(bytes).map_err(|err| CodecError::Decode {
            detail: err.to_string(),
        })?;
        Ok(Self(value))
    }
}

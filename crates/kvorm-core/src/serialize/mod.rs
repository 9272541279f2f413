//! Record value serialization.
//!
//! Format-level only: callers that want a size cap pass it explicitly to
//! [`deserialize_bounded`]. Stored record values never exceed
//! [`MAX_VALUE_BYTES`] on the read path.

mod cbor;

use crate::error::{Error, ErrorKind, ErrorOrigin};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error as ThisError;

/// Upper bound on a stored record value accepted by table reads.
pub const MAX_VALUE_BYTES: usize = 4 * 1024 * 1024;

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("deserialize size limit exceeded: {len} bytes (limit {max_bytes})")]
    DeserializeSizeLimitExceeded { len: usize, max_bytes: usize },
}

// Undecodable stored bytes are corruption; anything else is a serializer fault.
impl From<SerializeError> for Error {
    fn from(err: SerializeError) -> Self {
        let kind = match err {
            SerializeError::Serialize(_) => ErrorKind::Serialize,
            SerializeError::Deserialize(_) | SerializeError::DeserializeSizeLimitExceeded { .. } => {
                ErrorKind::Corruption
            }
        };

        Self::new(kind, ErrorOrigin::Serialize, err.to_string())
    }
}

/// Serialize a record value to deterministic CBOR.
pub fn serialize<T>(ty: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    cbor::serialize(ty)
}

/// Deserialize a value produced by [`serialize`].
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize_bounded(bytes, MAX_VALUE_BYTES)
}

/// Deserialize a value produced by [`serialize`], with an explicit size limit.
pub fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize_bounded(bytes, max_bytes)
}

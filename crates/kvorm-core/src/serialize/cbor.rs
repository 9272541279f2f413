use crate::serialize::SerializeError;
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};

pub(super) fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes, rejecting oversized input before decoding.
/// A decoder panic is reported as a deserialize error.
pub(super) fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > max_bytes {
        return Err(SerializeError::DeserializeSizeLimitExceeded {
            len: bytes.len(),
            max_bytes,
        });
    }

    match catch_unwind(AssertUnwindSafe(|| from_slice(bytes))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Row {
        name: String,
        count: u32,
    }

    #[test]
    fn round_trips_struct() {
        let row = Row {
            name: "abc".into(),
            count: 7,
        };
        let bytes = serialize(&row).unwrap();

        assert_eq!(deserialize_bounded::<Row>(&bytes, 1024).unwrap(), row);
    }

    #[test]
    fn rejects_oversized_payload() {
        let err = deserialize_bounded::<Row>(&[0u8; 32], 8).unwrap_err();

        assert!(matches!(
            err,
            SerializeError::DeserializeSizeLimitExceeded { len: 32, max_bytes: 8 }
        ));
    }

    #[test]
    fn garbage_is_a_deserialize_error() {
        let err = deserialize_bounded::<Row>(&[0xff, 0x00, 0x13], 1024).unwrap_err();

        assert!(matches!(err, SerializeError::Deserialize(_)));
    }
}

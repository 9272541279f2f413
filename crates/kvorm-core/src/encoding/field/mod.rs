//! Module: encoding::field
//! Responsibility: order-preserving byte encodings for single key fields.
//! Does not own: multi-field composition (see `encoding::key`).
//! Boundary: `FieldCodec` is chosen once per key field when a table is built.

mod boolean;
mod bytes;
mod compact;
mod enumeration;
mod int;
mod string;
mod time;
mod uint;

#[cfg(test)]
mod tests;

pub use bytes::MAX_NON_TERMINAL_BYTES;
pub use compact::{
    compact_u32_len, compact_u64_len, decode_compact_u32, decode_compact_u64, encode_compact_u32,
    encode_compact_u64,
};

use crate::{
    encoding::reader::KeyReader,
    error::{Error, ErrorKind, ErrorOrigin},
    model::{FieldDescriptor, FieldKind, FieldShape},
    value::Value,
};
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// FieldCodecError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum FieldCodecError {
    /// Reader empty at a field boundary; a prefix key ends here.
    #[error("end of key")]
    Eof,

    #[error("key ended inside a {codec} field")]
    Truncated { codec: &'static str },

    #[error("bytes field too long: {len} bytes (limit {max})")]
    BytesTooLong { len: usize, max: usize },

    #[error("illegal null terminator found in index string: {0:?}")]
    NullTerminator(String),

    #[error("{codec} codec cannot encode a {found} value")]
    TypeMismatch {
        codec: &'static str,
        found: &'static str,
    },

    #[error("{0} is out of range")]
    OutOfRange(String),

    #[error("invalid byte {byte:#04x} in {codec} field")]
    InvalidByte { codec: &'static str, byte: u8 },

    #[error("invalid varint in {codec} field")]
    Varint { codec: &'static str },

    #[error("invalid utf-8 in string field")]
    Utf8,

    #[error("stored {0} is out of range")]
    Undecodable(String),
}

impl FieldCodecError {
    /// Re-tag a boundary EOF as truncation once a field has started.
    pub(crate) fn mid_field(self, codec: &'static str) -> Self {
        match self {
            Self::Eof => Self::Truncated { codec },
            other => other,
        }
    }
}

impl From<FieldCodecError> for Error {
    fn from(err: FieldCodecError) -> Self {
        let kind = match err {
            FieldCodecError::BytesTooLong { .. } => ErrorKind::BytesFieldTooLong,
            FieldCodecError::NullTerminator(_)
            | FieldCodecError::TypeMismatch { .. }
            | FieldCodecError::OutOfRange(_) => ErrorKind::InvalidKeyField,
            FieldCodecError::Eof
            | FieldCodecError::Truncated { .. }
            | FieldCodecError::InvalidByte { .. }
            | FieldCodecError::Varint { .. }
            | FieldCodecError::Utf8
            | FieldCodecError::Undecodable(_) => ErrorKind::Corruption,
        };

        Self::new(kind, ErrorOrigin::Field, err.to_string())
    }
}

// Boundary read of a fixed-width field: empty reader is EOF, short reader is truncation.
pub(crate) fn read_fixed<const N: usize>(
    r: &mut KeyReader<'_>,
    codec: &'static str,
) -> Result<[u8; N], FieldCodecError> {
    if r.is_empty() {
        return Err(FieldCodecError::Eof);
    }

    r.read_array::<N>().ok_or(FieldCodecError::Truncated { codec })
}

///
/// FieldCodec
///
/// Encoding strategy for one key field. Non-terminal variants are
/// self-delimiting; `Bytes` and `String` consume the rest of the key and
/// may only close a key.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldCodec {
    Bool,
    Bytes,
    NonTerminalBytes,
    String,
    NonTerminalString,
    Int32,
    Int64,
    Uint32,
    Uint64,
    FixedUint32,
    FixedUint64,
    Enum,
    Timestamp,
    Duration,
}

impl FieldCodec {
    /// Pick the codec for a key field. `non_terminal` is true for every field
    /// but the last one in a key.
    pub fn for_field(field: &FieldDescriptor, non_terminal: bool) -> Result<Self, Error> {
        if field.shape != FieldShape::Singular {
            return Err(Error::invalid_key_field(format!(
                "{} field {} can't be used in a key",
                field.shape.as_str(),
                field.name
            )));
        }

        let codec = match field.kind {
            FieldKind::Bool => Self::Bool,
            FieldKind::String if non_terminal => Self::NonTerminalString,
            FieldKind::String => Self::String,
            FieldKind::Bytes if non_terminal => Self::NonTerminalBytes,
            FieldKind::Bytes => Self::Bytes,
            FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => Self::Int32,
            FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => Self::Int64,
            FieldKind::Uint32 => Self::Uint32,
            FieldKind::Fixed32 => Self::FixedUint32,
            FieldKind::Uint64 => Self::Uint64,
            FieldKind::Fixed64 => Self::FixedUint64,
            FieldKind::Enum => Self::Enum,
            FieldKind::Timestamp => Self::Timestamp,
            FieldKind::Duration => Self::Duration,
            FieldKind::Float | FieldKind::Double | FieldKind::Message => {
                return Err(Error::invalid_key_field(format!(
                    "field {} of kind {} can't be used in a key",
                    field.name, field.kind
                )));
            }
        };

        Ok(codec)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Bytes | Self::NonTerminalBytes => "bytes",
            Self::String | Self::NonTerminalString => "string",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 | Self::FixedUint32 => "uint32",
            Self::Uint64 | Self::FixedUint64 => "uint64",
            Self::Enum => "enum",
            Self::Timestamp => "timestamp",
            Self::Duration => "duration",
        }
    }

    /// Byte order of the encoding agrees with `compare`.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        !matches!(self, Self::NonTerminalBytes | Self::Enum)
    }

    /// Encoded width when constant.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Bool => Some(1),
            Self::Int32 | Self::FixedUint32 => Some(4),
            Self::Int64 | Self::FixedUint64 => Some(8),
            _ => None,
        }
    }

    #[must_use]
    pub fn compare(self, a: &Value, b: &Value) -> Ordering {
        a.cmp(b)
    }

    /// Upper bound on the encoded size of `value`; exact for every codec.
    pub fn compute_size(self, value: &Value) -> Result<usize, FieldCodecError> {
        if let Some(size) = self.fixed_size() {
            return Ok(size);
        }

        let size = match (self, value) {
            (Self::Bytes, Value::Bytes(v)) => v.len(),
            (Self::NonTerminalBytes, Value::Bytes(v)) => v.len() + 1,
            (Self::String, Value::String(v)) => v.len(),
            (Self::NonTerminalString, Value::String(v)) => v.len() + 1,
            (Self::Uint32, Value::Uint32(v)) => compact_u32_len(*v),
            (Self::Uint64, Value::Uint64(v)) => compact_u64_len(*v),
            (Self::Enum, Value::Enum(v)) => enumeration::encoded_len(*v),
            (Self::Timestamp, Value::Timestamp(v)) => time::encoded_len(v.is_some()),
            (Self::Duration, Value::Duration(v)) => time::encoded_len(v.is_some()),
            _ => return Err(self.mismatch(value)),
        };

        Ok(size)
    }

    pub fn encode(self, value: &Value, out: &mut Vec<u8>) -> Result<(), FieldCodecError> {
        match (self, value) {
            (Self::Bool, Value::Bool(v)) => boolean::encode(*v, out),
            (Self::Bytes, Value::Bytes(v)) => bytes::encode_terminal(v, out),
            (Self::NonTerminalBytes, Value::Bytes(v)) => bytes::encode_non_terminal(v, out)?,
            (Self::String, Value::String(v)) => string::encode_terminal(v, out),
            (Self::NonTerminalString, Value::String(v)) => string::encode_non_terminal(v, out)?,
            (Self::Int32, Value::Int32(v)) => int::encode_i32(*v, out),
            (Self::Int64, Value::Int64(v)) => int::encode_i64(*v, out),
            (Self::Uint32, Value::Uint32(v)) => encode_compact_u32(*v, out),
            (Self::Uint64, Value::Uint64(v)) => encode_compact_u64(*v, out),
            (Self::FixedUint32, Value::Uint32(v)) => uint::encode_u32(*v, out),
            (Self::FixedUint64, Value::Uint64(v)) => uint::encode_u64(*v, out),
            (Self::Enum, Value::Enum(v)) => enumeration::encode(*v, out),
            (Self::Timestamp, Value::Timestamp(v)) => time::encode_timestamp(v.as_ref(), out)?,
            (Self::Duration, Value::Duration(v)) => time::encode_duration(v.as_ref(), out)?,
            _ => return Err(self.mismatch(value)),
        }

        Ok(())
    }

    /// Decode one field. `Eof` means the reader was empty at the boundary.
    pub fn decode(self, r: &mut KeyReader<'_>) -> Result<Value, FieldCodecError> {
        let value = match self {
            Self::Bool => Value::Bool(boolean::decode(r)?),
            Self::Bytes => Value::Bytes(bytes::decode_terminal(r)),
            Self::NonTerminalBytes => Value::Bytes(bytes::decode_non_terminal(r)?),
            Self::String => Value::String(string::decode_terminal(r)?),
            Self::NonTerminalString => Value::String(string::decode_non_terminal(r)?),
            Self::Int32 => Value::Int32(int::decode_i32(r)?),
            Self::Int64 => Value::Int64(int::decode_i64(r)?),
            Self::Uint32 => Value::Uint32(decode_compact_u32(r)?),
            Self::Uint64 => Value::Uint64(decode_compact_u64(r)?),
            Self::FixedUint32 => Value::Uint32(uint::decode_u32(r)?),
            Self::FixedUint64 => Value::Uint64(uint::decode_u64(r)?),
            Self::Enum => Value::Enum(enumeration::decode(r)?),
            Self::Timestamp => Value::Timestamp(time::decode_timestamp(r)?),
            Self::Duration => Value::Duration(time::decode_duration(r)?),
        };

        Ok(value)
    }

    const fn mismatch(self, value: &Value) -> FieldCodecError {
        FieldCodecError::TypeMismatch {
            codec: self.name(),
            found: value.kind_name(),
        }
    }
}

use super::FieldCodecError;
use crate::encoding::{
    reader::KeyReader,
    varint::{uvarint_len, write_uvarint, zigzag_decode, zigzag_encode},
};

// Signed varint of the enum number. Not order-preserving.

pub(super) fn encode(value: i32, out: &mut Vec<u8>) {
    write_uvarint(out, zigzag_encode(value.into()));
}

pub(super) fn encoded_len(value: i32) -> usize {
    uvarint_len(zigzag_encode(value.into()))
}

pub(super) fn decode(r: &mut KeyReader<'_>) -> Result<i32, FieldCodecError> {
    if r.is_empty() {
        return Err(FieldCodecError::Eof);
    }
    let raw = r.read_uvarint().map_err(|err| match err {
        leb128::read::Error::IoError(_) => FieldCodecError::Truncated { codec: "enum" },
        leb128::read::Error::Overflow => FieldCodecError::Varint { codec: "enum" },
    })?;

    i32::try_from(zigzag_decode(raw)).map_err(|_| FieldCodecError::Varint { codec: "enum" })
}

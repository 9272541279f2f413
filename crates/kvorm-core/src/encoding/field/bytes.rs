use super::FieldCodecError;
use crate::encoding::reader::KeyReader;

/// Longest payload a length-prefixed bytes field can carry.
pub const MAX_NON_TERMINAL_BYTES: usize = 255;

pub(super) fn encode_terminal(value: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(value);
}

// Consumes the remainder; an empty remainder is an empty value.
pub(super) fn decode_terminal(r: &mut KeyReader<'_>) -> Vec<u8> {
    r.read_rest().to_vec()
}

pub(super) fn encode_non_terminal(value: &[u8], out: &mut Vec<u8>) -> Result<(), FieldCodecError> {
    let len = u8::try_from(value.len()).map_err(|_| FieldCodecError::BytesTooLong {
        len: value.len(),
        max: MAX_NON_TERMINAL_BYTES,
    })?;
    out.push(len);
    out.extend_from_slice(value);

    Ok(())
}

pub(super) fn decode_non_terminal(r: &mut KeyReader<'_>) -> Result<Vec<u8>, FieldCodecError> {
    let len = r.read_byte().ok_or(FieldCodecError::Eof)?;

    r.read_exact(len.into())
        .map(<[u8]>::to_vec)
        .ok_or(FieldCodecError::Truncated { codec: "bytes" })
}

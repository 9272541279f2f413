use super::FieldCodecError;
use crate::encoding::reader::KeyReader;

const TERMINATOR: u8 = 0x00;

pub(super) fn encode_terminal(value: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(value.as_bytes());
}

pub(super) fn decode_terminal(r: &mut KeyReader<'_>) -> Result<String, FieldCodecError> {
    to_string(r.read_rest())
}

pub(super) fn encode_non_terminal(value: &str, out: &mut Vec<u8>) -> Result<(), FieldCodecError> {
    if value.as_bytes().contains(&TERMINATOR) {
        return Err(FieldCodecError::NullTerminator(value.to_string()));
    }
    out.extend_from_slice(value.as_bytes());
    out.push(TERMINATOR);

    Ok(())
}

pub(super) fn decode_non_terminal(r: &mut KeyReader<'_>) -> Result<String, FieldCodecError> {
    if r.is_empty() {
        return Err(FieldCodecError::Eof);
    }
    let bytes = r
        .read_until(TERMINATOR)
        .ok_or(FieldCodecError::Truncated { codec: "string" })?;

    to_string(bytes)
}

fn to_string(bytes: &[u8]) -> Result<String, FieldCodecError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| FieldCodecError::Utf8)
}

use super::FieldCodecError;
use crate::encoding::reader::KeyReader;

pub(super) fn encode(value: bool, out: &mut Vec<u8>) {
    out.push(u8::from(value));
}

pub(super) fn decode(r: &mut KeyReader<'_>) -> Result<bool, FieldCodecError> {
    match r.read_byte() {
        None => Err(FieldCodecError::Eof),
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        Some(byte) => Err(FieldCodecError::InvalidByte {
            codec: "bool",
            byte,
        }),
    }
}

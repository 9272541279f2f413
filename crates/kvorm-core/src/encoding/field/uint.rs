use super::{FieldCodecError, read_fixed};
use crate::encoding::reader::KeyReader;

pub(super) fn encode_u32(value: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub(super) fn decode_u32(r: &mut KeyReader<'_>) -> Result<u32, FieldCodecError> {
    read_fixed::<4>(r, "fixed32").map(u32::from_be_bytes)
}

pub(super) fn encode_u64(value: u64, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub(super) fn decode_u64(r: &mut KeyReader<'_>) -> Result<u64, FieldCodecError> {
    read_fixed::<8>(r, "fixed64").map(u64::from_be_bytes)
}

use super::{FieldCodecError, read_fixed};
use crate::encoding::reader::KeyReader;

// Adding the sign bias maps two's-complement order onto unsigned order.
const I32_BIAS: u32 = 1 << 31;
const I64_BIAS: u64 = 1 << 63;

pub(super) fn encode_i32(value: i32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.cast_unsigned().wrapping_add(I32_BIAS).to_be_bytes());
}

pub(super) fn decode_i32(r: &mut KeyReader<'_>) -> Result<i32, FieldCodecError> {
    let bytes = read_fixed::<4>(r, "int32")?;

    Ok(u32::from_be_bytes(bytes).wrapping_sub(I32_BIAS).cast_signed())
}

pub(super) fn encode_i64(value: i64, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.cast_unsigned().wrapping_add(I64_BIAS).to_be_bytes());
}

pub(super) fn decode_i64(r: &mut KeyReader<'_>) -> Result<i64, FieldCodecError> {
    let bytes = read_fixed::<8>(r, "int64")?;

    Ok(u64::from_be_bytes(bytes).wrapping_sub(I64_BIAS).cast_signed())
}

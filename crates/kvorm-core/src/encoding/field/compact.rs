//! Variable-length unsigned integers that keep big-endian order.
//!
//! The top two bits of the first byte select the total width, and widths
//! grow with the value, so shorter encodings always sort first.
//!
//! | tag | u32 width | u32 max  | u64 width | u64 max  |
//! |-----|-----------|----------|-----------|----------|
//! | 00  | 2         | 2^14 - 1 | 2         | 2^14 - 1 |
//! | 01  | 3         | 2^22 - 1 | 4         | 2^30 - 1 |
//! | 10  | 4         | 2^30 - 1 | 6         | 2^46 - 1 |
//! | 11  | 5         | u32::MAX | 9         | u64::MAX |
//!
//! The widest form stores the full value after a bare `0xC0` tag byte.

use super::FieldCodecError;
use crate::encoding::reader::KeyReader;

const TAG_SHIFT: u32 = 6;
const PAYLOAD_MASK: u8 = 0x3F;
const TAG_1: u8 = 0x40;
const TAG_2: u8 = 0x80;
const TAG_3: u8 = 0xC0;

const U32_MAX_2: u32 = (1 << 14) - 1;
const U32_MAX_3: u32 = (1 << 22) - 1;
const U32_MAX_4: u32 = (1 << 30) - 1;

const U64_MAX_2: u64 = (1 << 14) - 1;
const U64_MAX_4: u64 = (1 << 30) - 1;
const U64_MAX_6: u64 = (1 << 46) - 1;

pub fn encode_compact_u32(value: u32, out: &mut Vec<u8>) {
    let b = value.to_be_bytes();
    if value <= U32_MAX_2 {
        out.extend_from_slice(&b[2..]);
    } else if value <= U32_MAX_3 {
        out.extend_from_slice(&[TAG_1 | b[1], b[2], b[3]]);
    } else if value <= U32_MAX_4 {
        out.extend_from_slice(&[TAG_2 | b[0], b[1], b[2], b[3]]);
    } else {
        out.push(TAG_3);
        out.extend_from_slice(&b);
    }
}

#[must_use]
pub const fn compact_u32_len(value: u32) -> usize {
    if value <= U32_MAX_2 {
        2
    } else if value <= U32_MAX_3 {
        3
    } else if value <= U32_MAX_4 {
        4
    } else {
        5
    }
}

pub fn decode_compact_u32(r: &mut KeyReader<'_>) -> Result<u32, FieldCodecError> {
    let mut buf = [0u8; 4];
    decode_into(r, &mut buf, &[1, 2, 3, 4], "uint32")?;

    Ok(u32::from_be_bytes(buf))
}

pub fn encode_compact_u64(value: u64, out: &mut Vec<u8>) {
    let b = value.to_be_bytes();
    if value <= U64_MAX_2 {
        out.extend_from_slice(&b[6..]);
    } else if value <= U64_MAX_4 {
        out.extend_from_slice(&[TAG_1 | b[4], b[5], b[6], b[7]]);
    } else if value <= U64_MAX_6 {
        out.push(TAG_2 | b[2]);
        out.extend_from_slice(&b[3..]);
    } else {
        out.push(TAG_3);
        out.extend_from_slice(&b);
    }
}

#[must_use]
pub const fn compact_u64_len(value: u64) -> usize {
    if value <= U64_MAX_2 {
        2
    } else if value <= U64_MAX_4 {
        4
    } else if value <= U64_MAX_6 {
        6
    } else {
        9
    }
}

pub fn decode_compact_u64(r: &mut KeyReader<'_>) -> Result<u64, FieldCodecError> {
    let mut buf = [0u8; 8];
    decode_into(r, &mut buf, &[1, 3, 5, 8], "uint64")?;

    Ok(u64::from_be_bytes(buf))
}

// Reads one compact value into the low end of `buf`. `tail_lens[tag]` is the
// number of bytes following the tag byte.
fn decode_into(
    r: &mut KeyReader<'_>,
    buf: &mut [u8],
    tail_lens: &[usize; 4],
    codec: &'static str,
) -> Result<(), FieldCodecError> {
    let first = r.read_byte().ok_or(FieldCodecError::Eof)?;
    let tag = usize::from(first >> TAG_SHIFT);
    let tail_len = tail_lens[tag];
    let tail = r
        .read_exact(tail_len)
        .ok_or(FieldCodecError::Truncated { codec })?;

    let start = buf.len() - tail_len;
    buf[start..].copy_from_slice(tail);

    if tail_len == buf.len() {
        // widest form: the tag byte carries no payload
        if first != TAG_3 {
            return Err(FieldCodecError::InvalidByte { codec, byte: first });
        }
    } else {
        buf[start - 1] = first & PAYLOAD_MASK;
    }

    Ok(())
}

use crate::encoding::reader::KeyReader;

/// Append `value` as unsigned LEB128.
pub fn write_uvarint(out: &mut Vec<u8>, value: u64) {
    let mut buf = [0u8; 10];
    let mut slice = &mut buf[..];
    // ten bytes hold any u64
    if let Ok(n) = leb128::write::unsigned(&mut slice, value) {
        out.extend_from_slice(&buf[..n]);
    }
}

#[must_use]
pub const fn uvarint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 { 1 } else { bits.div_ceil(7) }
}

#[must_use]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)).cast_unsigned()
}

#[must_use]
pub const fn zigzag_decode(value: u64) -> i64 {
    (value >> 1).cast_signed() ^ -((value & 1).cast_signed())
}

/// `prefix ++ uvarint(id)`, the layout of every table and index prefix.
#[must_use]
pub fn append_uvarint(prefix: &[u8], id: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + uvarint_len(id.into()));
    out.extend_from_slice(prefix);
    write_uvarint(&mut out, id.into());

    out
}

/// Read a uvarint that must fit a `u32` id.
pub fn read_id(r: &mut KeyReader<'_>) -> Option<u32> {
    r.read_uvarint().ok().and_then(|id| u32::try_from(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uvarint_lengths_match_encoding() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, 32_768, u64::MAX] {
            let mut out = Vec::new();
            write_uvarint(&mut out, value);
            assert_eq!(out.len(), uvarint_len(value), "{value}");
        }
    }

    #[test]
    fn sequence_id_is_three_bytes() {
        assert_eq!(append_uvarint(&[0xaa], 32_768), vec![0xaa, 0x80, 0x80, 0x02]);
    }

    #[test]
    fn zigzag_matches_signed_varint_mapping() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        for v in [i64::MIN, -7, 0, 9, i64::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }
}

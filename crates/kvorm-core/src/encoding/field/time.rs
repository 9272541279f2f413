use super::{FieldCodecError, int};
use crate::{
    encoding::reader::KeyReader,
    value::{Duration, Timestamp},
};

// A lone 0xFF marks an absent value. Every present encoding starts with the
// biased seconds, whose first byte stays below 0xFF inside the valid range,
// so absent values sort last.
const ABSENT: u8 = 0xFF;
const PRESENT_LEN: usize = 12;

pub(super) const fn encoded_len(present: bool) -> usize {
    if present { PRESENT_LEN } else { 1 }
}

pub(super) fn encode_timestamp(
    value: Option<&Timestamp>,
    out: &mut Vec<u8>,
) -> Result<(), FieldCodecError> {
    match value {
        None => out.push(ABSENT),
        Some(ts) => {
            if !ts.is_valid() {
                return Err(FieldCodecError::OutOfRange(format!("timestamp {ts}")));
            }
            int::encode_i64(ts.seconds, out);
            int::encode_i32(ts.nanos, out);
        }
    }

    Ok(())
}

pub(super) fn decode_timestamp(
    r: &mut KeyReader<'_>,
) -> Result<Option<Timestamp>, FieldCodecError> {
    let Some((seconds, nanos)) = decode_parts(r, "timestamp")? else {
        return Ok(None);
    };
    let ts = Timestamp::new(seconds, nanos);
    if !ts.is_valid() {
        return Err(FieldCodecError::Undecodable(format!("timestamp {ts}")));
    }

    Ok(Some(ts))
}

pub(super) fn encode_duration(
    value: Option<&Duration>,
    out: &mut Vec<u8>,
) -> Result<(), FieldCodecError> {
    match value {
        None => out.push(ABSENT),
        Some(d) => {
            if !d.is_valid() {
                return Err(FieldCodecError::OutOfRange(format!("duration {d}")));
            }
            int::encode_i64(d.seconds, out);
            int::encode_i32(d.nanos, out);
        }
    }

    Ok(())
}

pub(super) fn decode_duration(r: &mut KeyReader<'_>) -> Result<Option<Duration>, FieldCodecError> {
    let Some((seconds, nanos)) = decode_parts(r, "duration")? else {
        return Ok(None);
    };
    let d = Duration::new(seconds, nanos);
    if !d.is_valid() {
        return Err(FieldCodecError::Undecodable(format!("duration {d}")));
    }

    Ok(Some(d))
}

fn decode_parts(
    r: &mut KeyReader<'_>,
    codec: &'static str,
) -> Result<Option<(i64, i32)>, FieldCodecError> {
    match r.peek_byte() {
        None => return Err(FieldCodecError::Eof),
        Some(ABSENT) => {
            r.read_byte();
            return Ok(None);
        }
        Some(_) => {}
    }
    let seconds = int::decode_i64(r).map_err(|e| e.mid_field(codec))?;
    let nanos = int::decode_i32(r).map_err(|e| e.mid_field(codec))?;

    Ok(Some((seconds, nanos)))
}

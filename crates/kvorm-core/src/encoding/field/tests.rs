use super::*;
use crate::value::{Duration, Timestamp};
use proptest::prelude::*;

fn encode(codec: FieldCodec, value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    codec.encode(value, &mut out).expect("value should encode");
    out
}

fn decode_all(codec: FieldCodec, bytes: &[u8]) -> Value {
    let mut r = KeyReader::new(bytes);
    let value = codec.decode(&mut r).expect("bytes should decode");
    assert!(r.is_empty(), "{codec:?} left {} bytes", r.remaining());
    value
}

fn timestamp_strategy() -> BoxedStrategy<Value> {
    prop_oneof![
        1 => Just(Value::Timestamp(None)),
        8 => (Timestamp::MIN_SECONDS..=Timestamp::MAX_SECONDS, 0..1_000_000_000i32)
            .prop_map(|(s, n)| Value::from(Timestamp::new(s, n))),
    ]
    .boxed()
}

fn duration_strategy() -> BoxedStrategy<Value> {
    prop_oneof![
        1 => Just(Value::Duration(None)),
        8 => (Duration::MIN_SECONDS..=Duration::MAX_SECONDS, 0..1_000_000_000i32)
            .prop_map(|(s, n)| {
                let nanos = if s < 0 { -n } else { n };
                Value::from(Duration::new(s, nanos))
            }),
    ]
    .boxed()
}

// Pairs of (codec, value generator) covering every codec.
fn codec_value_strategy() -> BoxedStrategy<(FieldCodec, Value, Value)> {
    fn pair(codec: FieldCodec, s: BoxedStrategy<Value>) -> BoxedStrategy<(FieldCodec, Value, Value)> {
        (s.clone(), s).prop_map(move |(a, b)| (codec, a, b)).boxed()
    }

    prop_oneof![
        pair(FieldCodec::Bool, any::<bool>().prop_map(Value::Bool).boxed()),
        pair(
            FieldCodec::Bytes,
            proptest::collection::vec(any::<u8>(), 0..40).prop_map(Value::Bytes).boxed()
        ),
        pair(
            FieldCodec::NonTerminalBytes,
            proptest::collection::vec(any::<u8>(), 0..=255).prop_map(Value::Bytes).boxed()
        ),
        pair(FieldCodec::String, any::<String>().prop_map(Value::String).boxed()),
        pair(
            FieldCodec::NonTerminalString,
            "[^\\x00]{0,24}".prop_map(Value::String).boxed()
        ),
        pair(FieldCodec::Int32, any::<i32>().prop_map(Value::Int32).boxed()),
        pair(FieldCodec::Int64, any::<i64>().prop_map(Value::Int64).boxed()),
        pair(FieldCodec::Uint32, any::<u32>().prop_map(Value::Uint32).boxed()),
        pair(FieldCodec::Uint64, any::<u64>().prop_map(Value::Uint64).boxed()),
        pair(FieldCodec::FixedUint32, any::<u32>().prop_map(Value::Uint32).boxed()),
        pair(FieldCodec::FixedUint64, any::<u64>().prop_map(Value::Uint64).boxed()),
        pair(FieldCodec::Enum, any::<i32>().prop_map(Value::Enum).boxed()),
        pair(FieldCodec::Timestamp, timestamp_strategy()),
        pair(FieldCodec::Duration, duration_strategy()),
    ]
    .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1024))]

    #[test]
    fn decode_inverts_encode((codec, a, _b) in codec_value_strategy()) {
        let bytes = encode(codec, &a);

        prop_assert_eq!(decode_all(codec, &bytes), a.clone());
        prop_assert!(codec.compute_size(&a).unwrap() >= bytes.len());
        if let Some(size) = codec.fixed_size() {
            prop_assert_eq!(size, bytes.len());
        }
    }

    #[test]
    fn ordered_codecs_preserve_order((codec, a, b) in codec_value_strategy()) {
        prop_assume!(codec.is_ordered());

        let left = encode(codec, &a);
        let right = encode(codec, &b);
        prop_assert_eq!(left.cmp(&right), codec.compare(&a, &b));
    }
}

#[test]
fn signed_ints_are_biased_big_endian() {
    assert_eq!(encode(FieldCodec::Int32, &Value::Int32(0)), [0x80, 0, 0, 0]);
    assert_eq!(encode(FieldCodec::Int32, &Value::Int32(-1)), [0x7f, 0xff, 0xff, 0xff]);
    assert_eq!(
        encode(FieldCodec::Int64, &Value::Int64(i64::MIN)),
        [0, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn absent_time_values_encode_as_one_byte_and_sort_last() {
    let absent = encode(FieldCodec::Timestamp, &Value::Timestamp(None));
    let latest = encode(
        FieldCodec::Timestamp,
        &Value::from(Timestamp::new(Timestamp::MAX_SECONDS, 999_999_999)),
    );

    assert_eq!(absent, [0xff]);
    assert_eq!(latest.len(), 12);
    assert!(latest < absent);
    assert_eq!(decode_all(FieldCodec::Duration, &[0xff]), Value::Duration(None));
}

#[test]
fn out_of_range_timestamp_is_invalid_key_field() {
    let mut out = Vec::new();
    let err = FieldCodec::Timestamp
        .encode(&Value::from(Timestamp::new(Timestamp::MAX_SECONDS + 1, 0)), &mut out)
        .unwrap_err();

    assert_eq!(Error::from(err).kind, ErrorKind::InvalidKeyField);
}

#[test]
fn long_non_terminal_bytes_are_rejected() {
    let mut out = Vec::new();
    let err = FieldCodec::NonTerminalBytes
        .encode(&Value::Bytes(vec![7; 256]), &mut out)
        .unwrap_err();

    assert_eq!(err, FieldCodecError::BytesTooLong { len: 256, max: 255 });
    assert_eq!(Error::from(err).kind, ErrorKind::BytesFieldTooLong);
}

#[test]
fn null_inside_non_terminal_string_is_rejected() {
    let mut out = Vec::new();
    let err = FieldCodec::NonTerminalString
        .encode(&Value::from("a\0b"), &mut out)
        .unwrap_err();

    assert_eq!(Error::from(err).kind, ErrorKind::InvalidKeyField);
}

#[test]
fn empty_reader_is_eof_except_for_terminal_codecs() {
    for codec in [
        FieldCodec::Bool,
        FieldCodec::NonTerminalBytes,
        FieldCodec::NonTerminalString,
        FieldCodec::Int32,
        FieldCodec::Uint64,
        FieldCodec::FixedUint32,
        FieldCodec::Enum,
        FieldCodec::Timestamp,
    ] {
        let err = codec.decode(&mut KeyReader::new(&[])).unwrap_err();
        assert_eq!(err, FieldCodecError::Eof, "{codec:?}");
    }

    assert_eq!(
        FieldCodec::String.decode(&mut KeyReader::new(&[])).unwrap(),
        Value::from("")
    );
    assert_eq!(
        FieldCodec::Bytes.decode(&mut KeyReader::new(&[])).unwrap(),
        Value::Bytes(Vec::new())
    );
}

#[test]
fn partial_fixed_field_is_corruption() {
    let err = FieldCodec::Int64
        .decode(&mut KeyReader::new(&[0x80, 0]))
        .unwrap_err();

    assert_eq!(err, FieldCodecError::Truncated { codec: "int64" });
    assert_eq!(Error::from(err).kind, ErrorKind::Corruption);
}

#[test]
fn codec_selection_rejects_unkeyable_fields() {
    let double = FieldDescriptor::new("f64", 1, FieldKind::Double);
    let repeated = FieldDescriptor::new("tags", 2, FieldKind::String).with_shape(FieldShape::Repeated);
    let bytes = FieldDescriptor::new("bz", 3, FieldKind::Bytes);

    assert_eq!(
        FieldCodec::for_field(&double, false).unwrap_err().kind,
        ErrorKind::InvalidKeyField
    );
    assert_eq!(
        FieldCodec::for_field(&repeated, false).unwrap_err().kind,
        ErrorKind::InvalidKeyField
    );
    assert_eq!(FieldCodec::for_field(&bytes, true).unwrap(), FieldCodec::NonTerminalBytes);
    assert_eq!(FieldCodec::for_field(&bytes, false).unwrap(), FieldCodec::Bytes);
}

#[test]
fn type_mismatch_is_reported() {
    let mut out = Vec::new();
    let err = FieldCodec::Uint32
        .encode(&Value::from("nope"), &mut out)
        .unwrap_err();

    assert_eq!(
        err,
        FieldCodecError::TypeMismatch {
            codec: "uint32",
            found: "string"
        }
    );
}

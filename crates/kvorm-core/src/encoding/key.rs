use crate::{
    encoding::{
        field::{FieldCodec, FieldCodecError},
        reader::KeyReader,
    },
    error::{Error, ErrorOrigin},
    model::{FieldDescriptor, FieldNames},
    traits::Message,
    value::Value,
};
use std::cmp::Ordering;

///
/// DecodedKey
///
/// Values read from a key. `eof` is set when the key ran out at a field
/// boundary before every field was read, i.e. it was a prefix key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedKey {
    pub values: Vec<Value>,
    pub eof: bool,
}

///
/// KeyCodec
///
/// Encodes an ordered tuple of field values behind a fixed byte prefix.
/// Every field but the last uses a self-delimiting encoding.
///

#[derive(Clone, Debug)]
pub struct KeyCodec {
    prefix: Vec<u8>,
    fields: Vec<&'static FieldDescriptor>,
    field_names: FieldNames,
    codecs: Vec<FieldCodec>,
    fixed_size: usize,
}

impl KeyCodec {
    /// Resolve `field_names` against `M` and build the codec.
    pub fn new<M: Message>(prefix: Vec<u8>, field_names: &FieldNames) -> Result<Self, Error> {
        let fields = resolve_fields::<M>(field_names)?;

        Self::from_fields(prefix, fields)
    }

    pub fn from_fields(
        prefix: Vec<u8>,
        fields: Vec<&'static FieldDescriptor>,
    ) -> Result<Self, Error> {
        let last = fields.len().saturating_sub(1);
        let codecs = fields
            .iter()
            .enumerate()
            .map(|(i, field)| FieldCodec::for_field(field, i < last))
            .collect::<Result<Vec<_>, _>>()?;
        let fixed_size = codecs.iter().filter_map(|c| c.fixed_size()).sum();
        let field_names = FieldNames::from_names(&fields.iter().map(|f| f.name).collect::<Vec<_>>());

        Ok(Self {
            prefix,
            fields,
            field_names,
            codecs,
            fixed_size,
        })
    }

    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    #[must_use]
    pub fn fields(&self) -> &[&'static FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub const fn field_names(&self) -> &FieldNames {
        &self.field_names
    }

    #[must_use]
    pub fn codecs(&self) -> &[FieldCodec] {
        &self.codecs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Encode `values` (a full key or a leading prefix of it).
    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.compute_buffer_size(values)?);
        out.extend_from_slice(&self.prefix);
        for (codec, value) in self.codecs.iter().zip(values) {
            codec.encode(value, &mut out)?;
        }

        Ok(out)
    }

    /// Decode fields until the key is exhausted. The configured prefix must
    /// lead the reader.
    pub fn decode(&self, r: &mut KeyReader<'_>) -> Result<DecodedKey, Error> {
        if !r.skip_prefix(&self.prefix) {
            return Err(Error::unexpected_prefix(
                ErrorOrigin::Key,
                format!("key does not start with prefix {:x?}", self.prefix),
            ));
        }

        let mut values = Vec::with_capacity(self.codecs.len());
        for codec in &self.codecs {
            match codec.decode(r) {
                Ok(value) => values.push(value),
                Err(FieldCodecError::Eof) => return Ok(DecodedKey { values, eof: true }),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(DecodedKey { values, eof: false })
    }

    /// Decode a whole key; trailing bytes are corruption.
    pub fn decode_bytes(&self, key: &[u8]) -> Result<DecodedKey, Error> {
        let mut r = KeyReader::new(key);
        let decoded = self.decode(&mut r)?;
        if !r.is_empty() {
            return Err(Error::corruption(
                ErrorOrigin::Key,
                format!("{} trailing bytes after key", r.remaining()),
            ));
        }

        Ok(decoded)
    }

    pub fn compute_buffer_size(&self, values: &[Value]) -> Result<usize, Error> {
        self.check_len(values)?;

        let mut size = self.prefix.len() + self.fixed_size;
        for (codec, value) in self.codecs.iter().zip(values) {
            if codec.fixed_size().is_none() {
                size += codec.compute_size(value)?;
            }
        }

        Ok(size)
    }

    /// Field-wise comparison; on a tie the shorter tuple sorts first.
    #[must_use]
    pub fn compare_values(&self, a: &[Value], b: &[Value]) -> Ordering {
        for ((codec, x), y) in self.codecs.iter().zip(a).zip(b) {
            let cmp = codec.compare(x, y);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }

        a.len().cmp(&b.len())
    }

    #[must_use]
    pub fn is_fully_ordered(&self) -> bool {
        self.codecs.iter().all(|c| c.is_ordered())
    }

    /// Check that `[start, end]` is a well-formed range over this key.
    ///
    /// Bounds are compared field by field. The first differing field must
    /// have `start < end`; every later field present in either bound must
    /// use an ordered encoding, since byte order past the split decides
    /// which entries fall inside.
    pub fn check_valid_range_iteration_keys(
        &self,
        start: &[Value],
        end: &[Value],
    ) -> Result<(), Error> {
        self.check_len(start)?;
        self.check_len(end)?;

        let shortest = start.len().min(end.len());
        let longest = start.len().max(end.len());

        let mut split = None;
        for i in 0..shortest {
            let codec = self.codecs[i];
            match codec.compare(&start[i], &end[i]) {
                Ordering::Equal => {}
                Ordering::Greater => {
                    return Err(Error::invalid_range(format!(
                        "start must be before end for field {}",
                        self.fields[i].name
                    )));
                }
                Ordering::Less => {
                    if !codec.is_ordered() {
                        return Err(self.unordered_field(i));
                    }
                    split = Some(i + 1);
                    break;
                }
            }
        }

        let rest = match split {
            Some(next) => next,
            None if start.len() == end.len() => {
                return Err(Error::invalid_range("start must be before end"));
            }
            None => shortest,
        };

        for i in rest..longest {
            if !self.codecs[i].is_ordered() {
                return Err(self.unordered_field(i));
            }
        }

        Ok(())
    }

    /// Read this key's field values out of a message.
    pub fn get_key_values<M: Message>(&self, message: &M) -> Result<Vec<Value>, Error> {
        self.fields
            .iter()
            .map(|field| {
                message.get(field).ok_or_else(|| {
                    Error::invalid_key_field(format!(
                        "{} has no scalar value for field {}",
                        M::MESSAGE_NAME,
                        field.name
                    ))
                })
            })
            .collect()
    }

    pub fn encode_key_from_message<M: Message>(
        &self,
        message: &M,
    ) -> Result<(Vec<Value>, Vec<u8>), Error> {
        let values = self.get_key_values(message)?;
        let key = self.encode(&values)?;

        Ok((values, key))
    }

    /// Write `values` back into the key fields of `message`.
    pub fn set_key_values<M: Message>(&self, message: &mut M, values: &[Value]) -> Result<(), Error> {
        for (field, value) in self.fields.iter().zip(values) {
            message.set(field, value.clone())?;
        }

        Ok(())
    }

    pub fn clear_values<M: Message>(&self, message: &mut M) -> Result<(), Error> {
        for field in &self.fields {
            message.clear(field)?;
        }

        Ok(())
    }

    fn check_len(&self, values: &[Value]) -> Result<(), Error> {
        if values.len() > self.codecs.len() {
            return Err(Error::index_out_of_bounds(format!(
                "got {} values for a key with {} fields ({})",
                values.len(),
                self.codecs.len(),
                self.field_names
            )));
        }

        Ok(())
    }

    fn unordered_field(&self, i: usize) -> Error {
        Error::invalid_range(format!(
            "field {} of kind {} doesn't support ordered range iteration",
            self.fields[i].name, self.fields[i].kind
        ))
    }
}

/// Look up each named field on `M`.
pub(crate) fn resolve_fields<M: Message>(
    names: &FieldNames,
) -> Result<Vec<&'static FieldDescriptor>, Error> {
    names
        .iter()
        .map(|name| {
            M::field(name).ok_or_else(|| {
                Error::invalid_key_field(format!(
                    "field {name} not found on {}",
                    M::MESSAGE_NAME
                ))
            })
        })
        .collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        test_fixtures::{ExampleTable, ex},
    };
    use proptest::prelude::*;

    fn codec(fields: &str) -> KeyCodec {
        KeyCodec::new::<ExampleTable>(vec![0xab, 0x01], &FieldNames::parse(fields).unwrap())
            .expect("key codec")
    }

    #[test]
    fn last_field_is_terminal() {
        let c = codec("str,bz,str");

        assert_eq!(
            c.codecs(),
            [
                FieldCodec::NonTerminalString,
                FieldCodec::NonTerminalBytes,
                FieldCodec::String
            ]
        );
    }

    fn assert_prefixes_decode_with_eof(c: &KeyCodec, full: &[Value], upto: usize) {
        for k in 0..upto {
            let bytes = c.encode(&full[..k]).unwrap();
            let decoded = c.decode_bytes(&bytes).unwrap();
            assert_eq!(decoded.values, &full[..k]);
            assert!(decoded.eof);
            assert_eq!(c.compare_values(&full[..k], full), Ordering::Less);
        }

        let decoded = c.decode_bytes(&c.encode(full).unwrap()).unwrap();
        assert_eq!(decoded.values, full);
        assert!(!decoded.eof);
    }

    #[test]
    fn prefix_key_decodes_with_eof() {
        // the last prefix before a terminal string is a full key with ""
        let full = [Value::Uint32(4), Value::Int64(-2), Value::from("abc")];
        assert_prefixes_decode_with_eof(&codec("u32,i64,str"), &full, full.len() - 1);

        let full = [Value::Uint32(4), Value::from("abc"), Value::Int64(-2)];
        assert_prefixes_decode_with_eof(&codec("u32,str,i64"), &full, full.len());
    }

    #[test]
    fn empty_terminal_field_decodes_as_full_key() {
        let c = codec("u32,i64,str");
        let full = [Value::Uint32(4), Value::Int64(-2), Value::from("")];
        let bytes = c.encode(&full).unwrap();

        assert_eq!(bytes, c.encode(&full[..2]).unwrap());
        let decoded = c.decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.values, full);
        assert!(!decoded.eof);
    }

    #[test]
    fn too_many_values_is_index_out_of_bounds() {
        let c = codec("u32");
        let err = c.encode(&[Value::Uint32(1), Value::Uint32(2)]).unwrap_err();

        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let c = codec("u32");
        let err = c.decode_bytes(&[0xab, 0x02, 0, 1]).unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnexpectedDecodePrefix);
    }

    #[test]
    fn buffer_size_covers_prefix_keys() {
        let c = codec("u32,i64,str");
        let values = [Value::Uint32(70_000), Value::Int64(5)];

        assert!(c.compute_buffer_size(&values).unwrap() >= c.encode(&values).unwrap().len());
    }

    #[test]
    fn message_key_values_round_trip() {
        let c = codec("u32,i64,str");
        let msg = ex(4, -2, "abc");
        let (values, _) = c.encode_key_from_message(&msg).unwrap();

        let mut blank = ExampleTable::default();
        c.set_key_values(&mut blank, &values).unwrap();
        assert_eq!(c.get_key_values(&blank).unwrap(), values);

        c.clear_values(&mut blank).unwrap();
        assert_eq!(blank, ExampleTable::default());
    }

    #[test]
    fn range_checks() {
        let c = codec("u32,i64,str");
        let ok = |s: &[Value], e: &[Value]| c.check_valid_range_iteration_keys(s, e);

        assert!(ok(&[Value::Uint32(4), Value::Int64(-1)], &[Value::Uint32(7)]).is_ok());
        assert!(ok(&[Value::Uint32(4)], &[Value::Uint32(4), Value::Int64(1)]).is_ok());
        assert!(
            ok(
                &[Value::Uint32(5), Value::Int64(-3)],
                &[Value::Uint32(8), Value::Int64(1), Value::from("abc")]
            )
            .is_ok()
        );

        let err = ok(&[Value::Uint32(7)], &[Value::Uint32(4)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRangeIterationKeys);

        let err = ok(&[Value::Uint32(4)], &[Value::Uint32(4)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRangeIterationKeys);
    }

    #[test]
    fn range_past_an_unordered_field_is_rejected() {
        let c = codec("bz,str");
        let err = c
            .check_valid_range_iteration_keys(
                &[Value::Bytes(vec![1]), Value::from("a")],
                &[Value::Bytes(vec![2]), Value::from("b")],
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRangeIterationKeys);

        // equal unordered prefix, ordered split after it
        assert!(
            c.check_valid_range_iteration_keys(
                &[Value::Bytes(vec![1]), Value::from("a")],
                &[Value::Bytes(vec![1]), Value::from("b")],
            )
            .is_ok()
        );
        assert!(!c.is_fully_ordered());
        assert!(codec("u32,i64,str").is_fully_ordered());
    }

    proptest! {
        #[test]
        fn encoded_order_matches_compare_values(
            a in (any::<u32>(), any::<i64>(), "[a-z]{1,6}"),
            b in (any::<u32>(), any::<i64>(), "[a-z]{1,6}"),
            ka in 0usize..=3,
            kb in 0usize..=3,
        ) {
            let c = codec("u32,i64,str");
            let va = vec![Value::Uint32(a.0), Value::Int64(a.1), Value::String(a.2)];
            let vb = vec![Value::Uint32(b.0), Value::Int64(b.1), Value::String(b.2)];
            let (va, vb) = (&va[..ka], &vb[..kb]);

            let ea = c.encode(va).unwrap();
            let eb = c.encode(vb).unwrap();
            prop_assert_eq!(ea.cmp(&eb), c.compare_values(va, vb));
        }
    }
}

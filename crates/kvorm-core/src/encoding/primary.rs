use crate::{
    encoding::{
        entry::{Entry, EntryCodec, PrimaryKeyEntry, check_table_name, wrong_variant},
        index::{DecodedIndexKey, IndexCodec},
        key::KeyCodec,
    },
    error::Error,
    model::FieldNames,
    serialize::{deserialize, serialize},
    traits::Message,
    value::Value,
};
use std::marker::PhantomData;

///
/// PrimaryKeyCodec
///
/// Layout: `table prefix ++ uvarint(0) ++ key fields` -> record bytes.
/// Key fields are cleared from the stored record and restored on read.
///

#[derive(Clone, Debug)]
pub struct PrimaryKeyCodec<M> {
    key_codec: KeyCodec,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> PrimaryKeyCodec<M> {
    pub fn new(prefix: Vec<u8>, fields: &FieldNames) -> Result<Self, Error> {
        Ok(Self {
            key_codec: KeyCodec::new::<M>(prefix, fields)?,
            _marker: PhantomData,
        })
    }

    /// Record bytes for `message`, with key fields cleared.
    pub fn marshal_value(&self, message: &M) -> Result<Vec<u8>, Error> {
        let mut stripped = message.clone();
        self.key_codec.clear_values(&mut stripped)?;

        Ok(serialize(&stripped)?)
    }

    /// Decode record bytes and restore the key fields from `key`.
    pub fn unmarshal_value(&self, key: &[Value], value: &[u8]) -> Result<M, Error> {
        let mut message: M = deserialize(value)?;
        self.key_codec.set_key_values(&mut message, key)?;

        Ok(message)
    }

    /// Decode a raw primary key/value pair straight into a message.
    pub fn unmarshal(&self, key: &[u8], value: &[u8]) -> Result<M, Error> {
        let decoded = self.key_codec.decode_bytes(key)?;

        self.unmarshal_value(&decoded.values, value)
    }

    pub fn encode_kv(&self, message: &M) -> Result<(Vec<Value>, Vec<u8>, Vec<u8>), Error> {
        let (values, key) = self.key_codec.encode_key_from_message(message)?;
        let value = self.marshal_value(message)?;

        Ok((values, key, value))
    }
}

impl<M: Message> EntryCodec<M> for PrimaryKeyCodec<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        let decoded = self.key_codec.decode_bytes(key)?;
        // stored records are never empty; a key without a value is a prefix
        let value = if decoded.eof || value.is_empty() {
            None
        } else {
            Some(self.unmarshal_value(&decoded.values, value)?)
        };

        Ok(Entry::PrimaryKey(PrimaryKeyEntry::new(decoded.values, value)))
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let Entry::PrimaryKey(pk) = entry else {
            return Err(wrong_variant("primary key", entry));
        };
        check_table_name(entry)?;

        let key = self.key_codec.encode(&pk.key)?;
        let value = match &pk.value {
            Some(message) => self.marshal_value(message)?,
            None => return Err(Error::bad_decode_entry("primary key entry has no value")),
        };

        Ok((key, value))
    }
}

impl<M: Message> IndexCodec<M> for PrimaryKeyCodec<M> {
    fn key_codec(&self) -> &KeyCodec {
        &self.key_codec
    }

    fn decode_index_key(&self, key: &[u8], _value: &[u8]) -> Result<DecodedIndexKey, Error> {
        let decoded = self.key_codec.decode_bytes(key)?;
        let primary_key = (!decoded.eof).then(|| decoded.values.clone());

        Ok(DecodedIndexKey {
            index_values: decoded.values,
            primary_key,
        })
    }

    fn encode_kv_from_message(&self, message: &M) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let (_, key, value) = self.encode_kv(message)?;

        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        model::{FieldDescriptor, FieldKind},
        test_fixtures::{ExampleTable, ex},
    };

    fn codec() -> PrimaryKeyCodec<ExampleTable> {
        PrimaryKeyCodec::new(vec![0x01, 0x00], &FieldNames::parse("u32,i64,str").unwrap()).unwrap()
    }

    #[test]
    fn stored_value_omits_key_fields() {
        let c = codec();
        let mut msg = ex(4, -2, "abc");
        msg.u64 = 99;
        let (values, key, value) = c.encode_kv(&msg).unwrap();

        let stored: ExampleTable = deserialize(&value).unwrap();
        assert_eq!(stored.u32, 0);
        assert_eq!(stored.str, "");
        assert_eq!(stored.u64, 99);

        assert_eq!(c.unmarshal(&key, &value).unwrap(), msg);
        assert_eq!(c.unmarshal_value(&values, &value).unwrap(), msg);
    }

    #[test]
    fn entry_round_trip_is_byte_exact() {
        let c = codec();
        let (_, key, value) = c.encode_kv(&ex(7, 1, "x")).unwrap();
        let entry = c.decode_entry(&key, &value).unwrap();

        assert_eq!(c.encode_entry(&entry).unwrap(), (key, value));
    }

    #[test]
    fn key_without_value_decodes_as_prefix_entry() {
        let c = codec();
        let key = c.key_codec.encode(&[Value::Uint32(4), Value::Int64(-2)]).unwrap();
        let Entry::PrimaryKey(entry) = c.decode_entry(&key, &[]).unwrap() else {
            panic!("expected a primary key entry");
        };

        assert_eq!(entry.value, None);
        assert_eq!(entry.key[..2], [Value::Uint32(4), Value::Int64(-2)]);
    }

    #[test]
    fn rejected_zero_value_fails_marshal() {
        let c = PrimaryKeyCodec::<NonZeroId>::new(vec![0x02, 0x00], &FieldNames::parse("id").unwrap())
            .unwrap();
        let err = c.marshal_value(&NonZeroId { id: 3, note: "x".into() }).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidKeyField);
    }

    #[derive(Clone, Debug, Default, serde::Deserialize, PartialEq, serde::Serialize)]
    struct NonZeroId {
        id: u32,
        note: String,
    }

    static NON_ZERO_ID_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::new("id", 1, FieldKind::Uint32),
        FieldDescriptor::new("note", 2, FieldKind::String),
    ];

    impl Message for NonZeroId {
        const MESSAGE_NAME: &'static str = "testpb.NonZeroId";

        fn fields() -> &'static [FieldDescriptor] {
            &NON_ZERO_ID_FIELDS
        }

        fn get(&self, field: &FieldDescriptor) -> Option<Value> {
            match field.name {
                "id" => Some(Value::Uint32(self.id)),
                "note" => Some(Value::String(self.note.clone())),
                _ => None,
            }
        }

        fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), Error> {
            match (field.name, value) {
                ("id", Value::Uint32(0)) => {
                    return Err(Error::invalid_key_field("id must be non-zero"));
                }
                ("id", Value::Uint32(v)) => self.id = v,
                ("note", Value::String(v)) => self.note = v,
                (name, _) => return Err(Error::invalid_key_field(format!("bad value for {name}"))),
            }

            Ok(())
        }
    }

    #[test]
    fn foreign_entries_are_bad_decode_entries() {
        let c = codec();
        let foreign: Entry<ExampleTable> = Entry::PrimaryKey(PrimaryKeyEntry {
            table_name: "other.Table",
            key: vec![Value::Uint32(1)],
            value: Some(ExampleTable::default()),
        });
        assert_eq!(c.encode_entry(&foreign).unwrap_err().kind, ErrorKind::BadDecodeEntry);

        let seq: Entry<ExampleTable> = Entry::Seq(crate::encoding::entry::SeqEntry {
            table_name: ExampleTable::MESSAGE_NAME,
            value: 1,
        });
        assert_eq!(c.encode_entry(&seq).unwrap_err().kind, ErrorKind::BadDecodeEntry);
    }
}

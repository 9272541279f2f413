use crate::{
    encoding::{
        entry::{Entry, EntryCodec, IndexKeyEntry, check_table_name, wrong_variant},
        index::{DecodedIndexKey, IndexCodec},
        key::{KeyCodec, resolve_fields},
    },
    error::{Error, ErrorOrigin},
    model::{FieldDescriptor, FieldNames},
    traits::Message,
    value::Value,
};
use std::marker::PhantomData;

///
/// PkFieldSource
///
/// Where one primary key field lives in a unique index entry.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PkFieldSource {
    Key(usize),
    Value(usize),
}

///
/// UniqueKeyCodec
///
/// Unique secondary index. The key holds only the index fields; primary key
/// fields the index does not cover are stored in the value.
///

#[derive(Clone, Debug)]
pub struct UniqueKeyCodec<M> {
    key_codec: KeyCodec,
    value_codec: KeyCodec,
    index_fields: FieldNames,
    pk_fields: FieldNames,
    pk_field_order: Vec<PkFieldSource>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> UniqueKeyCodec<M> {
    pub fn new(prefix: Vec<u8>, index_fields: &FieldNames, pk_fields: &FieldNames) -> Result<Self, Error> {
        if index_fields.is_empty() {
            return Err(Error::invalid_table("index fields must not be empty"));
        }
        if pk_fields.is_empty() {
            return Err(Error::invalid_table("primary key fields must not be empty"));
        }

        let key_fields = resolve_fields::<M>(index_fields)?;
        let mut value_fields: Vec<&'static FieldDescriptor> = Vec::new();
        let mut pk_field_order = Vec::with_capacity(pk_fields.len());
        for field in resolve_fields::<M>(pk_fields)? {
            let source = match key_fields.iter().position(|f| f.name == field.name) {
                Some(pos) => PkFieldSource::Key(pos),
                None => {
                    value_fields.push(field);
                    PkFieldSource::Value(value_fields.len() - 1)
                }
            };
            pk_field_order.push(source);
        }

        if value_fields.is_empty() {
            return Err(Error::invalid_table(format!(
                "unique index {index_fields} on {} already contains the whole primary key \
                 and adds no uniqueness constraint; declare it non-unique",
                M::MESSAGE_NAME
            )));
        }

        Ok(Self {
            key_codec: KeyCodec::from_fields(prefix, key_fields)?,
            value_codec: KeyCodec::from_fields(Vec::new(), value_fields)?,
            index_fields: index_fields.clone(),
            pk_fields: pk_fields.clone(),
            pk_field_order,
            _marker: PhantomData,
        })
    }

    #[must_use]
    pub const fn index_fields(&self) -> &FieldNames {
        &self.index_fields
    }

    fn extract_primary_key(&self, key_values: &[Value], value_values: &[Value]) -> Vec<Value> {
        self.pk_field_order
            .iter()
            .map(|source| match *source {
                PkFieldSource::Key(i) => key_values[i].clone(),
                PkFieldSource::Value(i) => value_values[i].clone(),
            })
            .collect()
    }

    fn decode_value(&self, value: &[u8]) -> Result<Vec<Value>, Error> {
        let decoded = self.value_codec.decode_bytes(value)?;
        if decoded.eof {
            return Err(Error::corruption(
                ErrorOrigin::Index,
                format!(
                    "unique index {} value is missing primary key fields",
                    self.index_fields
                ),
            ));
        }

        Ok(decoded.values)
    }
}

impl<M: Message> IndexCodec<M> for UniqueKeyCodec<M> {
    fn key_codec(&self) -> &KeyCodec {
        &self.key_codec
    }

    fn decode_index_key(&self, key: &[u8], value: &[u8]) -> Result<DecodedIndexKey, Error> {
        let decoded = self.key_codec.decode_bytes(key)?;
        if decoded.eof {
            return Ok(DecodedIndexKey {
                index_values: decoded.values,
                primary_key: None,
            });
        }
        let value_values = self.decode_value(value)?;
        let primary_key = self.extract_primary_key(&decoded.values, &value_values);

        Ok(DecodedIndexKey {
            index_values: decoded.values,
            primary_key: Some(primary_key),
        })
    }

    fn encode_kv_from_message(&self, message: &M) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let (_, key) = self.key_codec.encode_key_from_message(message)?;
        let (_, value) = self.value_codec.encode_key_from_message(message)?;

        Ok((key, value))
    }
}

impl<M: Message> EntryCodec<M> for UniqueKeyCodec<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        let decoded = self.decode_index_key(key, value)?;

        Ok(Entry::IndexKey(IndexKeyEntry {
            table_name: M::MESSAGE_NAME,
            fields: self.index_fields.clone(),
            is_unique: true,
            index_values: decoded.index_values,
            primary_key: decoded.primary_key.unwrap_or_default(),
        }))
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let Entry::IndexKey(idx) = entry else {
            return Err(wrong_variant("unique index key", entry));
        };
        check_table_name(entry)?;
        if !idx.is_unique || idx.fields != self.index_fields {
            return Err(Error::bad_decode_entry(format!(
                "entry for index {} does not belong to unique index {}",
                idx.fields, self.index_fields
            )));
        }
        if idx.primary_key.len() != self.pk_field_order.len() {
            return Err(Error::bad_decode_entry(format!(
                "expected {} primary key values, got {}",
                self.pk_field_order.len(),
                idx.primary_key.len()
            )));
        }

        let mut value_values = Vec::with_capacity(self.value_codec.len());
        for (j, source) in self.pk_field_order.iter().enumerate() {
            match *source {
                PkFieldSource::Value(_) => value_values.push(idx.primary_key[j].clone()),
                PkFieldSource::Key(i) => {
                    if idx.index_values.get(i) != Some(&idx.primary_key[j]) {
                        return Err(Error::bad_decode_entry(format!(
                            "primary key field {} does not match its index value",
                            self.pk_fields[j]
                        )));
                    }
                }
            }
        }

        let key = self.key_codec.encode(&idx.index_values)?;
        let value = self.value_codec.encode(&value_values)?;

        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        test_fixtures::{ExampleTable, ex},
    };

    fn codec() -> UniqueKeyCodec<ExampleTable> {
        UniqueKeyCodec::new(
            vec![0x01, 0x01],
            &FieldNames::parse("u64,str").unwrap(),
            &FieldNames::parse("u32,i64,str").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn uncovered_primary_key_fields_go_to_the_value() {
        let c = codec();

        assert_eq!(c.key_codec().field_names().to_string(), "u64,str");
        assert_eq!(c.value_codec.field_names().to_string(), "u32,i64");
        assert_eq!(
            c.pk_field_order,
            [
                PkFieldSource::Value(0),
                PkFieldSource::Value(1),
                PkFieldSource::Key(1)
            ]
        );
    }

    #[test]
    fn decode_rebuilds_primary_key() {
        let c = codec();
        let mut msg = ex(4, -2, "abc");
        msg.u64 = 10;
        let (key, value) = c.encode_kv_from_message(&msg).unwrap();
        let entry = c.decode_entry(&key, &value).unwrap();

        let Entry::IndexKey(idx) = &entry else {
            panic!("expected index entry");
        };
        assert_eq!(idx.index_values, [Value::Uint64(10), Value::from("abc")]);
        assert_eq!(
            idx.primary_key,
            [Value::Uint32(4), Value::Int64(-2), Value::from("abc")]
        );
        assert_eq!(c.encode_entry(&entry).unwrap(), (key, value));
    }

    #[test]
    fn mismatched_primary_key_is_rejected() {
        let c = codec();
        let entry: Entry<ExampleTable> = Entry::IndexKey(IndexKeyEntry {
            table_name: ExampleTable::MESSAGE_NAME,
            fields: FieldNames::parse("u64,str").unwrap(),
            is_unique: true,
            index_values: vec![Value::Uint64(10), Value::from("abc")],
            primary_key: vec![Value::Uint32(4), Value::Int64(-2), Value::from("abd")],
        });
        assert_eq!(c.encode_entry(&entry).unwrap_err().kind, ErrorKind::BadDecodeEntry);

        let short: Entry<ExampleTable> = Entry::IndexKey(IndexKeyEntry {
            table_name: ExampleTable::MESSAGE_NAME,
            fields: FieldNames::parse("u64,str").unwrap(),
            is_unique: true,
            index_values: vec![Value::Uint64(10), Value::from("abc")],
            primary_key: vec![Value::Uint32(4)],
        });
        assert_eq!(c.encode_entry(&short).unwrap_err().kind, ErrorKind::BadDecodeEntry);
    }

    #[test]
    fn index_covering_the_primary_key_is_rejected() {
        let err = UniqueKeyCodec::<ExampleTable>::new(
            vec![0x01, 0x04],
            &FieldNames::parse("str,u32,i64").unwrap(),
            &FieldNames::parse("u32,i64,str").unwrap(),
        )
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidTableDefinition);
    }
}

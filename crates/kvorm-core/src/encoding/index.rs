use crate::{
    encoding::{
        entry::{Entry, EntryCodec, IndexKeyEntry, check_table_name, wrong_variant},
        key::{KeyCodec, resolve_fields},
    },
    error::Error,
    model::{FieldDescriptor, FieldNames},
    traits::Message,
    value::Value,
};
use std::marker::PhantomData;

/// Value stored under every non-unique index key.
pub const INDEX_SENTINEL: &[u8] = &[0x00];

///
/// DecodedIndexKey
///
/// `primary_key` is `None` when the raw key was only a prefix.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedIndexKey {
    pub index_values: Vec<Value>,
    pub primary_key: Option<Vec<Value>>,
}

///
/// IndexCodec
///
/// Entry codec of anything iterable as an index: the primary key itself
/// and every secondary index.
///

pub trait IndexCodec<M>: EntryCodec<M> {
    fn key_codec(&self) -> &KeyCodec;

    fn decode_index_key(&self, key: &[u8], value: &[u8]) -> Result<DecodedIndexKey, Error>;

    fn encode_kv_from_message(&self, message: &M) -> Result<(Vec<u8>, Vec<u8>), Error>;
}

///
/// IndexKeyCodec
///
/// Non-unique secondary index. Key = index fields ++ the primary key fields
/// the index does not already contain; the value is a one-byte sentinel.
///

#[derive(Clone, Debug)]
pub struct IndexKeyCodec<M> {
    key_codec: KeyCodec,
    index_fields: FieldNames,
    pk_fields: FieldNames,
    // position in the key of each primary key field
    pk_field_order: Vec<usize>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> IndexKeyCodec<M> {
    pub fn new(prefix: Vec<u8>, index_fields: &FieldNames, pk_fields: &FieldNames) -> Result<Self, Error> {
        if index_fields.is_empty() {
            return Err(Error::invalid_table("index fields must not be empty"));
        }
        if pk_fields.is_empty() {
            return Err(Error::invalid_table("primary key fields must not be empty"));
        }

        let mut key_fields: Vec<&'static FieldDescriptor> = resolve_fields::<M>(index_fields)?;
        let mut pk_field_order = Vec::with_capacity(pk_fields.len());
        for field in resolve_fields::<M>(pk_fields)? {
            let pos = match key_fields.iter().position(|f| f.name == field.name) {
                Some(pos) => pos,
                None => {
                    key_fields.push(field);
                    key_fields.len() - 1
                }
            };
            pk_field_order.push(pos);
        }

        Ok(Self {
            key_codec: KeyCodec::from_fields(prefix, key_fields)?,
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

    #[must_use]
    pub const fn pk_fields(&self) -> &FieldNames {
        &self.pk_fields
    }

    // Pick the primary key out of a full set of key values.
    fn extract_primary_key(&self, values: &[Value]) -> Vec<Value> {
        self.pk_field_order
            .iter()
            .map(|&pos| values[pos].clone())
            .collect()
    }
}

impl<M: Message> IndexCodec<M> for IndexKeyCodec<M> {
    fn key_codec(&self) -> &KeyCodec {
        &self.key_codec
    }

    fn decode_index_key(&self, key: &[u8], _value: &[u8]) -> Result<DecodedIndexKey, Error> {
        let decoded = self.key_codec.decode_bytes(key)?;
        let primary_key = (!decoded.eof).then(|| self.extract_primary_key(&decoded.values));

        Ok(DecodedIndexKey {
            index_values: decoded.values,
            primary_key,
        })
    }

    fn encode_kv_from_message(&self, message: &M) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let (_, key) = self.key_codec.encode_key_from_message(message)?;

        Ok((key, INDEX_SENTINEL.to_vec()))
    }
}

impl<M: Message> EntryCodec<M> for IndexKeyCodec<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        let decoded = self.decode_index_key(key, value)?;

        Ok(Entry::IndexKey(IndexKeyEntry {
            table_name: M::MESSAGE_NAME,
            fields: self.index_fields.clone(),
            is_unique: false,
            index_values: decoded.index_values,
            primary_key: decoded.primary_key.unwrap_or_default(),
        }))
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let Entry::IndexKey(idx) = entry else {
            return Err(wrong_variant("index key", entry));
        };
        check_table_name(entry)?;
        if idx.is_unique || idx.fields != self.index_fields {
            return Err(Error::bad_decode_entry(format!(
                "entry for index {} does not belong to index {}",
                idx.fields, self.index_fields
            )));
        }

        Ok((self.key_codec.encode(&idx.index_values)?, INDEX_SENTINEL.to_vec()))
    }
}

use crate::{
    error::{Error, fmt_values},
    model::FieldNames,
    traits::Message,
    value::Value,
};
use std::fmt;

///
/// Entry
///
/// Decoded view of one raw key/value pair owned by a table.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Entry<M> {
    PrimaryKey(PrimaryKeyEntry<M>),
    IndexKey(IndexKeyEntry),
    Seq(SeqEntry),
}

impl<M> Entry<M> {
    #[must_use]
    pub const fn table_name(&self) -> &'static str {
        match self {
            Self::PrimaryKey(e) => e.table_name,
            Self::IndexKey(e) => e.table_name,
            Self::Seq(e) => e.table_name,
        }
    }

    pub(crate) fn variant_name(&self) -> &'static str {
        match self {
            Self::PrimaryKey(_) => "primary key",
            Self::IndexKey(e) if e.is_unique => "unique index key",
            Self::IndexKey(_) => "index key",
            Self::Seq(_) => "sequence",
        }
    }
}

impl<M: fmt::Debug> fmt::Display for Entry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKey(e) => fmt::Display::fmt(e, f),
            Self::IndexKey(e) => fmt::Display::fmt(e, f),
            Self::Seq(e) => fmt::Display::fmt(e, f),
        }
    }
}

///
/// PrimaryKeyEntry
///
/// `value` is `None` only for a prefix key.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PrimaryKeyEntry<M> {
    pub table_name: &'static str,
    pub key: Vec<Value>,
    pub value: Option<M>,
}

impl<M: Message> PrimaryKeyEntry<M> {
    #[must_use]
    pub fn new(key: Vec<Value>, value: Option<M>) -> Self {
        Self {
            table_name: M::MESSAGE_NAME,
            key,
            value,
        }
    }
}

impl<M: fmt::Debug> fmt::Display for PrimaryKeyEntry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PK {} {}", self.table_name, fmt_values(&self.key))?;
        match &self.value {
            Some(value) => write!(f, " -> {value:?}"),
            None => Ok(()),
        }
    }
}

///
/// IndexKeyEntry
///
/// `index_values` holds every value stored in the key. `primary_key` is empty
/// when the key is a prefix and no primary key could be recovered.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexKeyEntry {
    pub table_name: &'static str,
    pub fields: FieldNames,
    pub is_unique: bool,
    pub index_values: Vec<Value>,
    pub primary_key: Vec<Value>,
}

impl IndexKeyEntry {
    #[must_use]
    pub fn is_prefix(&self) -> bool {
        self.primary_key.is_empty()
    }
}

impl fmt::Display for IndexKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_unique { "UNIQ" } else { "IDX" };
        write!(
            f,
            "{label} {} {} : {}",
            self.table_name,
            self.fields,
            fmt_values(&self.index_values)
        )?;
        if !self.primary_key.is_empty() {
            write!(f, " -> {}", fmt_values(&self.primary_key))?;
        }

        Ok(())
    }
}

///
/// SeqEntry
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SeqEntry {
    pub table_name: &'static str,
    pub value: u64,
}

impl fmt::Display for SeqEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SEQ {} {}", self.table_name, self.value)
    }
}

///
/// EntryCodec
///
/// Translates between raw key/value bytes and typed entries.
///

pub trait EntryCodec<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error>;

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error>;
}

pub(crate) fn check_table_name<M: Message>(entry: &Entry<M>) -> Result<(), Error> {
    if entry.table_name() == M::MESSAGE_NAME {
        Ok(())
    } else {
        Err(Error::bad_decode_entry(format!(
            "expected table {}, got {}",
            M::MESSAGE_NAME,
            entry.table_name()
        )))
    }
}

pub(crate) fn wrong_variant<M>(expected: &str, entry: &Entry<M>) -> Error {
    Error::bad_decode_entry(format!(
        "expected {expected} entry, got {}",
        entry.variant_name()
    ))
}

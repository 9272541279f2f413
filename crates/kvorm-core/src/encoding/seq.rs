use crate::{
    encoding::{
        entry::{Entry, EntryCodec, SeqEntry, check_table_name, wrong_variant},
        reader::KeyReader,
        varint::write_uvarint,
    },
    error::{Error, ErrorOrigin},
    traits::Message,
};
use std::marker::PhantomData;

///
/// SeqCodec
///
/// Auto-increment counter stored at `table prefix ++ uvarint(32768)`.
/// An empty stored value reads as zero.
///

#[derive(Clone, Debug)]
pub struct SeqCodec<M> {
    prefix: Vec<u8>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> SeqCodec<M> {
    #[must_use]
    pub const fn new(prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn decode_value(value: &[u8]) -> Result<u64, Error> {
        if value.is_empty() {
            return Ok(0);
        }
        let mut r = KeyReader::new(value);
        let seq = r.read_uvarint().map_err(|_| {
            Error::corruption(ErrorOrigin::Entry, "undecodable sequence value")
        })?;
        if !r.is_empty() {
            return Err(Error::corruption(
                ErrorOrigin::Entry,
                "trailing bytes after sequence value",
            ));
        }

        Ok(seq)
    }

    #[must_use]
    pub fn encode_value(seq: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_uvarint(&mut out, seq);

        out
    }
}

impl<M: Message> EntryCodec<M> for SeqCodec<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        if key != self.prefix.as_slice() {
            return Err(Error::unexpected_prefix(
                ErrorOrigin::Entry,
                format!("{key:x?} is not the sequence key of {}", M::MESSAGE_NAME),
            ));
        }

        Ok(Entry::Seq(SeqEntry {
            table_name: M::MESSAGE_NAME,
            value: Self::decode_value(value)?,
        }))
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let Entry::Seq(seq) = entry else {
            return Err(wrong_variant("sequence", entry));
        };
        check_table_name(entry)?;

        Ok((self.prefix.clone(), Self::encode_value(seq.value)))
    }
}

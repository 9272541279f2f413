//! Module: encoding
//! Responsibility: byte layout of every key and value a table writes.
//! Does not own: store access or write ordering (see `table`).
//! Boundary: tables drive these codecs; nothing here touches a store.

pub mod entry;
pub mod field;
pub mod index;
pub mod key;
pub mod primary;
pub mod reader;
pub mod seq;
pub mod unique;
pub mod varint;

pub use entry::{Entry, EntryCodec, IndexKeyEntry, PrimaryKeyEntry, SeqEntry};
pub use field::{FieldCodec, FieldCodecError};
pub use index::{DecodedIndexKey, INDEX_SENTINEL, IndexCodec, IndexKeyCodec};
pub use key::{DecodedKey, KeyCodec};
pub use primary::PrimaryKeyCodec;
pub use reader::KeyReader;
pub use seq::SeqCodec;
pub use unique::UniqueKeyCodec;

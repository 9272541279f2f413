//! Module: store
//! Responsibility: the ordered key-value contract tables are written against,
//! plus the in-memory, batching and debugging implementations of it.
//! Does not own: key layout (see `encoding`).
//! Boundary: tables only ever talk to `ReadBackend` / `Backend`.

mod batch;
mod debug;
mod hooks;
mod memory;

pub use batch::BatchWriter;
pub use debug::{DebugBackend, EntryDebugger};
pub use hooks::{Hooks, WriteHooks};
pub use memory::{MemoryBackend, MemoryStore};

use crate::error::Error;

/// One raw key/value pair.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered iterator over raw pairs. Dropping it releases the range.
pub type RawIter<'a> = Box<dyn Iterator<Item = Result<KvPair, Error>> + 'a>;

///
/// ReadonlyStore
///
/// Ordered byte-keyed reads. Ranges are `[start, end)`; `None` is unbounded.
///

pub trait ReadonlyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    fn has(&self, key: &[u8]) -> Result<bool, Error> {
        Ok(self.get(key)?.is_some())
    }

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<RawIter<'_>, Error>;

    /// Same range as [`ReadonlyStore::iterator`], visited from the end.
    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<RawIter<'_>, Error>;
}

///
/// Store
///
/// Writes take `&self`; implementations use interior mutability.
/// No write may land inside a range while an iterator over it is open.
///

pub trait Store: ReadonlyStore {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Error>;

    fn delete(&self, key: &[u8]) -> Result<(), Error>;
}

///
/// ReadBackend
///
/// Read view over the commitment store (primary records) and the index
/// store (secondary lookups). Both may be the same physical store.
///

pub trait ReadBackend {
    fn commitment_store_reader(&self) -> &dyn ReadonlyStore;

    fn index_store_reader(&self) -> &dyn ReadonlyStore;
}

///
/// Backend
///

pub trait Backend: ReadBackend {
    fn commitment_store(&self) -> &dyn Store;

    fn index_store(&self) -> &dyn Store;

    /// Veto hooks run before every mutation.
    fn hooks(&self) -> Option<&dyn Hooks> {
        None
    }

    /// Notification hooks run after a batch is flushed.
    fn write_hooks(&self) -> Option<&dyn WriteHooks> {
        None
    }
}

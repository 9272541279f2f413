use crate::{
    error::Error,
    store::{Backend, Hooks, KvPair, RawIter, ReadBackend, ReadonlyStore, Store, WriteHooks},
};
use std::{cell::RefCell, collections::BTreeMap, fmt, ops::Bound};

///
/// MemoryStore
///
/// Ordered in-memory store. Iterators snapshot their range when created,
/// so writes never invalidate an open iterator.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: RefCell<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    /// Copy of every pair in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<KvPair> {
        self.map
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.map.borrow_mut().clear();
    }

    fn snapshot(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        if let (Some(start), Some(end)) = (start, end)
            && start >= end
        {
            return Vec::new();
        }

        let lower = start.map_or(Bound::Unbounded, Bound::Included);
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);

        self.map
            .borrow()
            .range::<[u8], _>((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ReadonlyStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> Result<bool, Error> {
        Ok(self.map.borrow().contains_key(key))
    }

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<RawIter<'_>, Error> {
        Ok(Box::new(self.snapshot(start, end).into_iter().map(Ok)))
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<RawIter<'_>, Error> {
        Ok(Box::new(self.snapshot(start, end).into_iter().rev().map(Ok)))
    }
}

impl Store for MemoryStore {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.map.borrow_mut().insert(key.to_vec(), value.to_vec());

        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), Error> {
        self.map.borrow_mut().remove(key);

        Ok(())
    }
}

///
/// MemoryBackend
///
/// Commitment and index stores held in memory, either as two separate
/// stores or as one shared store.
///

#[derive(Default)]
pub struct MemoryBackend {
    commitment: MemoryStore,
    // `None` when the index store is the commitment store
    index: Option<MemoryStore>,
    hooks: Option<Box<dyn Hooks>>,
    write_hooks: Option<Box<dyn WriteHooks>>,
}

impl MemoryBackend {
    /// Separate commitment and index stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: Some(MemoryStore::new()),
            ..Self::default()
        }
    }

    /// A single store serving as both commitment and index store.
    #[must_use]
    pub fn shared() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    #[must_use]
    pub fn with_write_hooks(mut self, hooks: impl WriteHooks + 'static) -> Self {
        self.write_hooks = Some(Box::new(hooks));
        self
    }

    #[must_use]
    pub const fn commitment(&self) -> &MemoryStore {
        &self.commitment
    }

    #[must_use]
    pub fn index(&self) -> &MemoryStore {
        self.index.as_ref().unwrap_or(&self.commitment)
    }

    #[must_use]
    pub const fn is_shared(&self) -> bool {
        self.index.is_none()
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("commitment_len", &self.commitment.len())
            .field("index_len", &self.index().len())
            .field("shared", &self.is_shared())
            .field("hooks", &self.hooks.is_some())
            .field("write_hooks", &self.write_hooks.is_some())
            .finish()
    }
}

impl ReadBackend for MemoryBackend {
    fn commitment_store_reader(&self) -> &dyn ReadonlyStore {
        &self.commitment
    }

    fn index_store_reader(&self) -> &dyn ReadonlyStore {
        self.index()
    }
}

impl Backend for MemoryBackend {
    fn commitment_store(&self) -> &dyn Store {
        &self.commitment
    }

    fn index_store(&self) -> &dyn Store {
        self.index()
    }

    fn hooks(&self) -> Option<&dyn Hooks> {
        self.hooks.as_deref()
    }

    fn write_hooks(&self) -> Option<&dyn WriteHooks> {
        self.write_hooks.as_deref()
    }
}

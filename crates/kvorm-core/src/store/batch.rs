use crate::{
    error::Error,
    obs::sink::{MetricsEvent, record},
    store::{Backend, Hooks, RawIter, ReadBackend, ReadonlyStore, Store, WriteHooks},
};
use std::{cell::RefCell, fmt};

const CHUNK_SIZE: usize = 16;

///
/// BatchOp
///

enum BatchOp<'a> {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
    Hook(Box<dyn FnOnce() + 'a>),
}

///
/// BatchStoreWriter
///
/// Buffers writes for one logical store in fixed-capacity chunks.
/// Reads go straight to the underlying store and do not see buffered writes.
///

struct BatchStoreWriter<'a> {
    store: &'a dyn Store,
    chunks: RefCell<Vec<Vec<BatchOp<'a>>>>,
}

impl<'a> BatchStoreWriter<'a> {
    const fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            chunks: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, op: BatchOp<'a>) {
        let mut chunks = self.chunks.borrow_mut();
        match chunks.last_mut() {
            Some(chunk) if chunk.len() < CHUNK_SIZE => chunk.push(op),
            _ => {
                let mut chunk = Vec::with_capacity(CHUNK_SIZE);
                chunk.push(op);
                chunks.push(chunk);
            }
        }
    }

    fn len(&self) -> usize {
        self.chunks.borrow().iter().map(Vec::len).sum()
    }

    // Take the buffer before applying it, so hooks may touch this writer.
    fn flush(&self) -> Result<usize, Error> {
        let chunks = std::mem::take(&mut *self.chunks.borrow_mut());
        let mut applied = 0;
        for op in chunks.into_iter().flatten() {
            match op {
                BatchOp::Set { key, value } => {
                    tracing::trace!(key = ?key, len = value.len(), "batch set");
                    self.store.set(&key, &value)?;
                }
                BatchOp::Delete { key } => {
                    tracing::trace!(key = ?key, "batch delete");
                    self.store.delete(&key)?;
                }
                BatchOp::Hook(hook) => hook(),
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn discard(&self) {
        self.chunks.borrow_mut().clear();
    }
}

impl ReadonlyStore for BatchStoreWriter<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        self.store.get(key)
    }

    fn has(&self, key: &[u8]) -> Result<bool, Error> {
        self.store.has(key)
    }

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<RawIter<'_>, Error> {
        self.store.iterator(start, end)
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<RawIter<'_>, Error> {
        self.store.reverse_iterator(start, end)
    }
}

impl Store for BatchStoreWriter<'_> {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.push(BatchOp::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        });

        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), Error> {
        self.push(BatchOp::Delete { key: key.to_vec() });

        Ok(())
    }
}

///
/// BatchWriter
///
/// Backend wrapper that records every write and applies them on
/// [`BatchWriter::write`]. Dropping or closing it without writing discards
/// the batch.
///

pub struct BatchWriter<'a> {
    parent: &'a dyn Backend,
    commitment: BatchStoreWriter<'a>,
    index: BatchStoreWriter<'a>,
}

impl<'a> BatchWriter<'a> {
    #[must_use]
    pub fn new(parent: &'a dyn Backend) -> Self {
        Self {
            parent,
            commitment: BatchStoreWriter::new(parent.commitment_store()),
            index: BatchStoreWriter::new(parent.index_store()),
        }
    }

    /// Backend the batch flushes into.
    #[must_use]
    pub fn parent(&self) -> &'a dyn Backend {
        self.parent
    }

    /// Queue `hook` to run when the batch is flushed, after the writes
    /// queued before it.
    pub fn enqueue_hook(&self, hook: impl FnOnce() + 'a) {
        self.commitment.push(BatchOp::Hook(Box::new(hook)));
    }

    /// Number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commitment.len() + self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every queued operation, index store first, then the commitment
    /// store and its hooks, and clear the buffers. On a store error the
    /// remaining operations are dropped.
    pub fn write(&self) -> Result<(), Error> {
        let index_ops = self.index.flush()?;
        let commitment_ops = self.commitment.flush()?;
        let ops = index_ops + commitment_ops;

        tracing::debug!(ops, "batch flushed");
        record(MetricsEvent::BatchFlush {
            ops: u64::try_from(ops).unwrap_or(u64::MAX),
        });

        Ok(())
    }

    /// Discard every queued operation.
    pub fn close(self) {
        self.commitment.discard();
        self.index.discard();
    }
}

impl fmt::Debug for BatchWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchWriter")
            .field("commitment_ops", &self.commitment.len())
            .field("index_ops", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl ReadBackend for BatchWriter<'_> {
    fn commitment_store_reader(&self) -> &dyn ReadonlyStore {
        &self.commitment
    }

    fn index_store_reader(&self) -> &dyn ReadonlyStore {
        &self.index
    }
}

impl Backend for BatchWriter<'_> {
    fn commitment_store(&self) -> &dyn Store {
        &self.commitment
    }

    fn index_store(&self) -> &dyn Store {
        &self.index
    }

    fn hooks(&self) -> Option<&dyn Hooks> {
        self.parent.hooks()
    }

    fn write_hooks(&self) -> Option<&dyn WriteHooks> {
        self.parent.write_hooks()
    }
}

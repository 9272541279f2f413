use crate::{
    encoding::{IndexCodec, IndexKeyCodec, UniqueKeyCodec},
    error::{Error, ErrorOrigin},
    model::{FieldNames, PRIMARY_KEY_INDEX_ID},
    obs::sink::{MetricsEvent, record},
    store::{Backend, BatchWriter, ReadBackend, ReadonlyStore},
    table::{
        engine::Table,
        iterator::{IteratorOptions, TableIterator, inclusive_end_bytes, prefix_end_bytes},
        paginate::{Page, PaginationRequest, paginate},
    },
    traits::Message,
    value::Value,
};
use derive_more::Deref;
use std::{cmp::Ordering, fmt};

///
/// IndexDelta
/// Index keys written and removed by one maintenance step.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct IndexDelta {
    pub(crate) inserts: u64,
    pub(crate) removes: u64,
}

impl IndexDelta {
    pub(crate) const fn add(&mut self, other: Self) {
        self.inserts = self.inserts.saturating_add(other.inserts);
        self.removes = self.removes.saturating_add(other.removes);
    }

    pub(crate) const fn is_empty(self) -> bool {
        self.inserts == 0 && self.removes == 0
    }

    const fn insert() -> Self {
        Self {
            inserts: 1,
            removes: 0,
        }
    }

    const fn remove() -> Self {
        Self {
            inserts: 0,
            removes: 1,
        }
    }
}

///
/// SecondaryCodec
///

#[derive(Clone, Debug)]
pub(crate) enum SecondaryCodec<M> {
    Unique(UniqueKeyCodec<M>),
    NonUnique(IndexKeyCodec<M>),
}

///
/// SecondaryIndex
///
/// One declared secondary index and the maintenance it performs when the
/// primary record changes.
///

#[derive(Clone, Debug)]
pub(crate) struct SecondaryIndex<M> {
    pub(crate) id: u32,
    pub(crate) fields: FieldNames,
    pub(crate) codec: SecondaryCodec<M>,
}

impl<M: Message> SecondaryIndex<M> {
    pub(crate) const fn is_unique(&self) -> bool {
        matches!(self.codec, SecondaryCodec::Unique(_))
    }

    pub(crate) fn codec(&self) -> &dyn IndexCodec<M> {
        match &self.codec {
            SecondaryCodec::Unique(c) => c,
            SecondaryCodec::NonUnique(c) => c,
        }
    }

    pub(crate) fn on_insert(&self, w: &dyn Backend, message: &M) -> Result<IndexDelta, Error> {
        let (key, value) = self.codec().encode_kv_from_message(message)?;
        self.check_unique(w, &key, message)?;
        w.index_store().set(&key, &value)?;

        Ok(IndexDelta::insert())
    }

    pub(crate) fn on_update(
        &self,
        w: &dyn Backend,
        new: &M,
        existing: &M,
    ) -> Result<IndexDelta, Error> {
        let key_codec = self.codec().key_codec();
        let new_values = key_codec.get_key_values(new)?;
        let old_values = key_codec.get_key_values(existing)?;
        if key_codec.compare_values(&new_values, &old_values) == Ordering::Equal {
            return Ok(IndexDelta::default());
        }

        let (new_key, new_value) = self.codec().encode_kv_from_message(new)?;
        self.check_unique(w, &new_key, new)?;
        let old_key = key_codec.encode(&old_values)?;
        w.index_store().delete(&old_key)?;
        w.index_store().set(&new_key, &new_value)?;

        Ok(IndexDelta {
            inserts: 1,
            removes: 1,
        })
    }

    pub(crate) fn on_delete(&self, w: &dyn Backend, message: &M) -> Result<IndexDelta, Error> {
        let (_, key) = self.codec().key_codec().encode_key_from_message(message)?;
        w.index_store().delete(&key)?;

        Ok(IndexDelta::remove())
    }

    fn check_unique(&self, w: &dyn Backend, key: &[u8], message: &M) -> Result<(), Error> {
        if !self.is_unique() || !w.index_store_reader().has(key)? {
            return Ok(());
        }

        let values = self.codec().key_codec().get_key_values(message)?;
        let fields = self.fields.to_string();
        tracing::warn!(table = M::MESSAGE_NAME, index = %fields, "unique index violation");
        record(MetricsEvent::UniqueViolation {
            table: M::MESSAGE_NAME,
        });

        Err(Error::unique_key_violation(M::MESSAGE_NAME, &fields, &values))
    }
}

///
/// IndexSel
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum IndexSel {
    Primary,
    Secondary(usize),
}

///
/// Index
///
/// Handle on one index of a table, the primary key included. Iterators
/// opened through it walk that index's key order.
///

pub struct Index<'t, M> {
    table: &'t Table<M>,
    sel: IndexSel,
}

impl<M> Clone for Index<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Index<'_, M> {}

impl<M: Message> fmt::Debug for Index<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("table", &M::MESSAGE_NAME)
            .field("id", &self.id())
            .field("fields", &self.fields().to_string())
            .field("unique", &self.is_unique())
            .finish()
    }
}

impl<'t, M: Message> Index<'t, M> {
    pub(crate) const fn new(table: &'t Table<M>, sel: IndexSel) -> Self {
        Self { table, sel }
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        match self.sel {
            IndexSel::Primary => PRIMARY_KEY_INDEX_ID,
            IndexSel::Secondary(i) => self.table.indexes[i].id,
        }
    }

    #[must_use]
    pub fn fields(&self) -> &'t FieldNames {
        match self.sel {
            IndexSel::Primary => &self.table.pk_fields,
            IndexSel::Secondary(i) => &self.table.indexes[i].fields,
        }
    }

    /// The primary key counts as unique.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        match self.sel {
            IndexSel::Primary => true,
            IndexSel::Secondary(i) => self.table.indexes[i].is_unique(),
        }
    }

    #[must_use]
    pub fn codec(&self) -> &'t dyn IndexCodec<M> {
        match self.sel {
            IndexSel::Primary => &self.table.primary,
            IndexSel::Secondary(i) => self.table.indexes[i].codec(),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &'t Table<M> {
        self.table
    }

    pub(crate) const fn sel(&self) -> IndexSel {
        self.sel
    }

    /// Store holding this index: commitment for the primary key, index
    /// store otherwise.
    pub(crate) fn store<'a>(&self, backend: &'a dyn ReadBackend) -> &'a dyn ReadonlyStore {
        match self.sel {
            IndexSel::Primary => backend.commitment_store_reader(),
            IndexSel::Secondary(_) => backend.index_store_reader(),
        }
    }

    /// Every entry of the index.
    pub fn iterator<'a>(
        &self,
        backend: &'a dyn ReadBackend,
        options: IteratorOptions<'a, M>,
    ) -> Result<TableIterator<'a, M>, Error>
    where
        't: 'a,
    {
        self.prefix_iterator(backend, &[], options)
    }

    /// Entries whose leading key fields equal `prefix`.
    pub fn prefix_iterator<'a>(
        &self,
        backend: &'a dyn ReadBackend,
        prefix: &[Value],
        options: IteratorOptions<'a, M>,
    ) -> Result<TableIterator<'a, M>, Error>
    where
        't: 'a,
    {
        let prefix = self.codec().key_codec().encode(prefix)?;
        let end = prefix_end_bytes(&prefix);

        let (start, end) = if options.reverse {
            (prefix, options.cursor.clone().or(end))
        } else {
            let start = match options.cursor.as_deref() {
                Some(cursor) => inclusive_end_bytes(cursor),
                None => prefix,
            };
            (start, end)
        };

        TableIterator::open(*self, backend, start, end, options)
    }

    /// Entries from `start` to `end`, both inclusive. A partial `end` takes
    /// in every key it prefixes.
    pub fn range_iterator<'a>(
        &self,
        backend: &'a dyn ReadBackend,
        start: &[Value],
        end: &[Value],
        options: IteratorOptions<'a, M>,
    ) -> Result<TableIterator<'a, M>, Error>
    where
        't: 'a,
    {
        let key_codec = self.codec().key_codec();
        key_codec.check_valid_range_iteration_keys(start, end)?;

        let start_key = key_codec.encode(start)?;
        let end_key = key_codec.encode(end)?;
        let end_bound = if end.len() == key_codec.len() {
            Some(inclusive_end_bytes(&end_key))
        } else {
            prefix_end_bytes(&end_key)
        };

        let (start, end) = if options.reverse {
            (start_key, options.cursor.clone().or(end_bound))
        } else {
            let start = match options.cursor.as_deref() {
                Some(cursor) => inclusive_end_bytes(cursor),
                None => start_key,
            };
            (start, end_bound)
        };

        TableIterator::open(*self, backend, start, end, options)
    }

    pub fn paginate<'a>(
        &self,
        backend: &'a dyn ReadBackend,
        request: PaginationRequest<'a, M>,
    ) -> Result<Page<M>, Error>
    where
        't: 'a,
    {
        paginate(*self, backend, request)
    }

    /// Delete every record whose index key starts with `prefix`.
    /// Returns the number of records deleted.
    pub fn delete_by_prefix(&self, backend: &dyn Backend, prefix: &[Value]) -> Result<u64, Error> {
        let it = self.prefix_iterator(backend, prefix, IteratorOptions::new())?;

        self.delete_all(backend, it)
    }

    /// Delete every record in the inclusive range `start..=end`.
    pub fn delete_range(
        &self,
        backend: &dyn Backend,
        start: &[Value],
        end: &[Value],
    ) -> Result<u64, Error> {
        let it = self.range_iterator(backend, start, end, IteratorOptions::new())?;

        self.delete_all(backend, it)
    }

    // Collect first, so no write lands while the iterator is open.
    fn delete_all(&self, backend: &dyn Backend, mut it: TableIterator<'_, M>) -> Result<u64, Error> {
        let mut keys = Vec::new();
        while it.advance()? {
            keys.push(it.primary_key()?);
        }
        drop(it);

        let batch = BatchWriter::new(backend);
        let mut deleted = 0u64;
        for key in &keys {
            if self.table.delete_into(&batch, key)? {
                deleted += 1;
            }
        }
        batch.write()?;

        tracing::debug!(
            table = M::MESSAGE_NAME,
            index = %self.fields(),
            deleted,
            "deleted records by index"
        );

        Ok(deleted)
    }
}

///
/// UniqueIndex
///
/// An index whose keys identify at most one record, so it supports
/// point lookups.
///

#[derive(Debug, Deref)]
pub struct UniqueIndex<'t, M: Message>(Index<'t, M>);

impl<M: Message> Clone for UniqueIndex<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Message> Copy for UniqueIndex<'_, M> {}

impl<'t, M: Message> UniqueIndex<'t, M> {
    pub(crate) const fn new(index: Index<'t, M>) -> Self {
        Self(index)
    }

    pub fn has(&self, backend: &dyn ReadBackend, values: &[Value]) -> Result<bool, Error> {
        if self.sel() == IndexSel::Primary {
            return self.table().has(backend, values);
        }
        let key = self.codec().key_codec().encode(values)?;

        self.store(backend).has(&key)
    }

    pub fn get(&self, backend: &dyn ReadBackend, values: &[Value]) -> Result<Option<M>, Error> {
        if self.sel() == IndexSel::Primary {
            return self.table().get(backend, values);
        }
        let key = self.codec().key_codec().encode(values)?;
        let Some(value) = self.store(backend).get(&key)? else {
            return Ok(None);
        };

        let decoded = self.codec().decode_index_key(&key, &value)?;
        let primary_key = decoded.primary_key.ok_or_else(|| {
            Error::not_found(
                ErrorOrigin::Index,
                format!("{} needs a value for every field of {}", M::MESSAGE_NAME, self.fields()),
            )
        })?;

        self.table().get(backend, &primary_key)?.map(Some).ok_or_else(|| {
            Error::corruption(
                ErrorOrigin::Index,
                format!(
                    "unique index {} of {} points at a missing record",
                    self.fields(),
                    M::MESSAGE_NAME
                ),
            )
        })
    }
}

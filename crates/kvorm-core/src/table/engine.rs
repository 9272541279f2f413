use crate::{
    encoding::{
        Entry, EntryCodec, IndexCodec, KeyReader, PrimaryKeyCodec, SeqCodec, varint::read_id,
    },
    error::{Error, ErrorOrigin},
    model::{FieldNames, PRIMARY_KEY_INDEX_ID, SEQUENCE_INDEX_ID},
    obs::sink::{MetricsEvent, SaveKind, record},
    store::{Backend, BatchWriter, EntryDebugger, ReadBackend},
    table::{
        AnyTable, JsonValidator, SaveMode, TableOptions,
        build::table_descriptor,
        index::{Index, IndexDelta, IndexSel, SecondaryIndex, UniqueIndex},
        iterator::{IteratorOptions, TableIterator},
        json,
        paginate::{Page, PaginationRequest},
    },
    traits::Message,
    value::Value,
};
use std::{any::Any, collections::BTreeMap, fmt};

///
/// Table
///
/// A message type stored under a primary key, with its secondary indexes
/// kept in step on every write. Each write runs in its own batch, so a
/// failed operation leaves the backend untouched.
///

pub struct Table<M> {
    pub(super) id: u32,
    pub(super) prefix: Vec<u8>,
    pub(super) pk_fields: FieldNames,
    pub(super) primary: PrimaryKeyCodec<M>,
    pub(super) indexes: Vec<SecondaryIndex<M>>,
    pub(super) by_id: BTreeMap<u32, usize>,
    pub(super) by_fields: BTreeMap<FieldNames, usize>,
    pub(super) seq: Option<SeqCodec<M>>,
    pub(super) json_validator: Option<JsonValidator<M>>,
}

impl<M: Message> fmt::Debug for Table<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &M::MESSAGE_NAME)
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .field("primary_key", &self.pk_fields.to_string())
            .field(
                "indexes",
                &self
                    .indexes
                    .iter()
                    .map(|i| i.fields.to_string())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<M: Message> Table<M> {
    pub fn build(options: TableOptions<M>) -> Result<Self, Error> {
        let descriptor = table_descriptor(&options)?;
        if descriptor.primary_key.auto_increment {
            return Err(Error::invalid_table(format!(
                "{} has an auto-increment primary key; build it as an AutoIncrementTable",
                M::MESSAGE_NAME
            )));
        }

        Self::from_descriptor(&options.prefix, &descriptor, options.json_validator)
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Prefix shared by every key of the table.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    #[must_use]
    pub const fn primary_key_fields(&self) -> &FieldNames {
        &self.pk_fields
    }

    #[must_use]
    pub const fn primary_key(&self) -> Index<'_, M> {
        Index::new(self, IndexSel::Primary)
    }

    /// Look an index up by its comma-separated field list. The primary key
    /// fields name the primary key index.
    #[must_use]
    pub fn index(&self, fields: &str) -> Option<Index<'_, M>> {
        let fields = FieldNames::parse(fields).ok()?;
        if fields == self.pk_fields {
            return Some(self.primary_key());
        }

        self.by_fields
            .get(&fields)
            .map(|&i| Index::new(self, IndexSel::Secondary(i)))
    }

    #[must_use]
    pub fn index_by_id(&self, id: u32) -> Option<Index<'_, M>> {
        if id == PRIMARY_KEY_INDEX_ID {
            return Some(self.primary_key());
        }

        self.by_id
            .get(&id)
            .map(|&i| Index::new(self, IndexSel::Secondary(i)))
    }

    #[must_use]
    pub fn unique_index(&self, fields: &str) -> Option<UniqueIndex<'_, M>> {
        self.index(fields)
            .filter(Index::is_unique)
            .map(UniqueIndex::new)
    }

    /// The primary key followed by every secondary index in declaration order.
    #[must_use]
    pub fn indexes(&self) -> Vec<Index<'_, M>> {
        std::iter::once(self.primary_key())
            .chain((0..self.indexes.len()).map(|i| Index::new(self, IndexSel::Secondary(i))))
            .collect()
    }

    pub fn get(&self, backend: &dyn ReadBackend, primary_key: &[Value]) -> Result<Option<M>, Error> {
        let key = self.encode_primary_key(primary_key)?;

        backend
            .commitment_store_reader()
            .get(&key)?
            .map(|value| self.primary.unmarshal_value(primary_key, &value))
            .transpose()
    }

    pub fn has(&self, backend: &dyn ReadBackend, primary_key: &[Value]) -> Result<bool, Error> {
        let key = self.encode_primary_key(primary_key)?;

        backend.commitment_store_reader().has(&key)
    }

    /// Insert a new record; fails if the primary key is taken.
    pub fn insert(&self, backend: &dyn Backend, message: &M) -> Result<(), Error> {
        self.save(backend, message, SaveMode::Insert)
    }

    /// Replace an existing record; fails if it does not exist.
    pub fn update(&self, backend: &dyn Backend, message: &M) -> Result<(), Error> {
        self.save(backend, message, SaveMode::Update)
    }

    pub fn save(&self, backend: &dyn Backend, message: &M, mode: SaveMode) -> Result<(), Error> {
        let batch = BatchWriter::new(backend);
        self.save_into(&batch, message, mode)?;

        batch.write()
    }

    /// Delete the record stored under `primary_key`. Deleting a missing
    /// record is a no-op.
    pub fn delete(&self, backend: &dyn Backend, primary_key: &[Value]) -> Result<(), Error> {
        let batch = BatchWriter::new(backend);
        self.delete_into(&batch, primary_key)?;

        batch.write()
    }

    /// Delete the record with the same primary key as `message`.
    pub fn delete_message(&self, backend: &dyn Backend, message: &M) -> Result<(), Error> {
        let primary_key = self.primary.key_codec().get_key_values(message)?;

        self.delete(backend, &primary_key)
    }

    pub fn iterator<'a>(
        &'a self,
        backend: &'a dyn ReadBackend,
        options: IteratorOptions<'a, M>,
    ) -> Result<TableIterator<'a, M>, Error> {
        self.primary_key().iterator(backend, options)
    }

    pub fn prefix_iterator<'a>(
        &'a self,
        backend: &'a dyn ReadBackend,
        prefix: &[Value],
        options: IteratorOptions<'a, M>,
    ) -> Result<TableIterator<'a, M>, Error> {
        self.primary_key().prefix_iterator(backend, prefix, options)
    }

    pub fn range_iterator<'a>(
        &'a self,
        backend: &'a dyn ReadBackend,
        start: &[Value],
        end: &[Value],
        options: IteratorOptions<'a, M>,
    ) -> Result<TableIterator<'a, M>, Error> {
        self.primary_key()
            .range_iterator(backend, start, end, options)
    }

    pub fn paginate<'a>(
        &'a self,
        backend: &'a dyn ReadBackend,
        request: PaginationRequest<'a, M>,
    ) -> Result<Page<M>, Error> {
        self.primary_key().paginate(backend, request)
    }

    pub fn delete_by_prefix(&self, backend: &dyn Backend, prefix: &[Value]) -> Result<u64, Error> {
        self.primary_key().delete_by_prefix(backend, prefix)
    }

    pub fn delete_range(
        &self,
        backend: &dyn Backend,
        start: &[Value],
        end: &[Value],
    ) -> Result<u64, Error> {
        self.primary_key().delete_range(backend, start, end)
    }

    // Only complete keys address a record.
    fn encode_primary_key(&self, primary_key: &[Value]) -> Result<Vec<u8>, Error> {
        let key_codec = self.primary.key_codec();
        if primary_key.len() != key_codec.len() {
            return Err(Error::invalid_key_field(format!(
                "{} primary key {} needs {} values, got {}",
                M::MESSAGE_NAME,
                self.pk_fields,
                key_codec.len(),
                primary_key.len()
            )));
        }

        key_codec.encode(primary_key)
    }

    /// Queue the writes for saving `message` onto `batch`.
    pub(crate) fn save_into<'a>(
        &self,
        batch: &BatchWriter<'a>,
        message: &M,
        mode: SaveMode,
    ) -> Result<SaveKind, Error> {
        let (primary_key, key, value) = self.primary.encode_kv(message)?;
        let existing = batch
            .commitment_store_reader()
            .get(&key)?
            .map(|bytes| self.primary.unmarshal_value(&primary_key, &bytes))
            .transpose()?;

        match (mode, &existing) {
            (SaveMode::Insert, Some(_)) => {
                tracing::warn!(table = M::MESSAGE_NAME, "insert over an existing primary key");
                return Err(Error::primary_key_violation(M::MESSAGE_NAME, &primary_key));
            }
            (SaveMode::Update, None) => {
                tracing::warn!(table = M::MESSAGE_NAME, "update of a missing record");
                return Err(Error::not_found_on_update(M::MESSAGE_NAME, &primary_key));
            }
            _ => {}
        }

        if let Some(hooks) = batch.hooks() {
            match &existing {
                Some(old) => hooks.on_update(old, message)?,
                None => hooks.on_insert(message)?,
            }
        }

        batch.commitment_store().set(&key, &value)?;

        let mut delta = IndexDelta::default();
        for index in &self.indexes {
            let step = match &existing {
                Some(old) => index.on_update(batch, message, old)?,
                None => index.on_insert(batch, message)?,
            };
            delta.add(step);
        }

        let kind = if existing.is_some() {
            SaveKind::Update
        } else {
            SaveKind::Insert
        };

        if let Some(hooks) = batch.parent().write_hooks() {
            let new = message.clone();
            match existing {
                Some(old) => batch.enqueue_hook(move || hooks.on_update(&old, &new)),
                None => batch.enqueue_hook(move || hooks.on_insert(&new)),
            }
        }

        tracing::debug!(table = M::MESSAGE_NAME, ?kind, key = ?key, "record saved");
        record(MetricsEvent::Save {
            table: M::MESSAGE_NAME,
            kind,
        });
        self.record_index_delta(delta);

        Ok(kind)
    }

    /// Queue the writes for deleting the record under `primary_key`.
    /// Returns false when there was nothing to delete.
    pub(crate) fn delete_into<'a>(
        &self,
        batch: &BatchWriter<'a>,
        primary_key: &[Value],
    ) -> Result<bool, Error> {
        let key = self.encode_primary_key(primary_key)?;
        let Some(bytes) = batch.commitment_store_reader().get(&key)? else {
            return Ok(false);
        };
        let message = self.primary.unmarshal_value(primary_key, &bytes)?;

        if let Some(hooks) = batch.hooks() {
            hooks.on_delete(&message)?;
        }

        batch.commitment_store().delete(&key)?;

        let mut delta = IndexDelta::default();
        for index in &self.indexes {
            delta.add(index.on_delete(batch, &message)?);
        }

        if let Some(hooks) = batch.parent().write_hooks() {
            batch.enqueue_hook(move || hooks.on_delete(&message));
        }

        tracing::debug!(table = M::MESSAGE_NAME, key = ?key, "record deleted");
        record(MetricsEvent::Delete {
            table: M::MESSAGE_NAME,
            rows: 1,
        });
        self.record_index_delta(delta);

        Ok(true)
    }

    fn record_index_delta(&self, delta: IndexDelta) {
        if delta.is_empty() {
            return;
        }

        record(MetricsEvent::IndexDelta {
            table: M::MESSAGE_NAME,
            inserts: delta.inserts,
            removes: delta.removes,
        });
    }

    pub(super) fn import_records(
        &self,
        backend: &dyn Backend,
        json: &serde_json::Value,
    ) -> Result<(), Error> {
        for item in json::records::<M>(json)? {
            let message = json::decode_record(item, self.json_validator.as_ref())?;
            self.save(backend, &message, SaveMode::Default)?;
        }

        Ok(())
    }

    pub(super) fn export_records(
        &self,
        backend: &dyn ReadBackend,
    ) -> Result<Vec<serde_json::Value>, Error> {
        self.iterator(backend, IteratorOptions::new())?
            .map(|message| json::encode_record(&message?))
            .collect()
    }

    pub(super) fn validate_records(&self, json: &serde_json::Value) -> Result<(), Error> {
        for item in json::records::<M>(json)? {
            let message = json::decode_record(item, self.json_validator.as_ref())?;
            self.primary.key_codec().encode_key_from_message(&message)?;
        }

        Ok(())
    }
}

impl<M: Message> EntryCodec<M> for Table<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        let mut r = KeyReader::new(key);
        if !r.skip_prefix(&self.prefix) {
            return Err(Error::unexpected_prefix(
                ErrorOrigin::Table,
                format!("{key:02x?} is outside table {}", M::MESSAGE_NAME),
            ));
        }
        let id = read_id(&mut r).ok_or_else(|| {
            Error::unexpected_prefix(
                ErrorOrigin::Table,
                format!("{key:02x?} has no index id for table {}", M::MESSAGE_NAME),
            )
        })?;

        match id {
            PRIMARY_KEY_INDEX_ID => self.primary.decode_entry(key, value),
            SEQUENCE_INDEX_ID => match &self.seq {
                Some(seq) => seq.decode_entry(key, value),
                None => Err(unknown_index::<M>(id)),
            },
            id => match self.by_id.get(&id) {
                Some(&i) => self.indexes[i].codec().decode_entry(key, value),
                None => Err(unknown_index::<M>(id)),
            },
        }
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        match entry {
            Entry::PrimaryKey(_) => self.primary.encode_entry(entry),
            Entry::Seq(_) => match &self.seq {
                Some(seq) => seq.encode_entry(entry),
                None => Err(Error::bad_decode_entry(format!(
                    "{} has no auto-increment sequence",
                    M::MESSAGE_NAME
                ))),
            },
            Entry::IndexKey(idx) => match self.by_fields.get(&idx.fields) {
                Some(&i) => self.indexes[i].codec().encode_entry(entry),
                None => Err(Error::bad_decode_entry(format!(
                    "{} has no index on {}",
                    M::MESSAGE_NAME,
                    idx.fields
                ))),
            },
        }
    }
}

fn unknown_index<M: Message>(id: u32) -> Error {
    Error::unexpected_prefix(
        ErrorOrigin::Table,
        format!("{} has no index with id {id}", M::MESSAGE_NAME),
    )
}

impl<M: Message> EntryDebugger for Table<M> {
    fn debug_entry(&self, key: &[u8], value: &[u8]) -> Result<String, Error> {
        Ok(self.decode_entry(key, value)?.to_string())
    }
}

impl<M: Message> AnyTable for Table<M> {
    fn message_name(&self) -> &'static str {
        M::MESSAGE_NAME
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn default_json_value(&self) -> serde_json::Value {
        serde_json::Value::Array(Vec::new())
    }

    fn validate_json_value(&self, json: &serde_json::Value) -> Result<(), Error> {
        self.validate_records(json)
    }

    fn import_json_value(
        &self,
        backend: &dyn Backend,
        json: &serde_json::Value,
    ) -> Result<(), Error> {
        self.import_records(backend, json)
    }

    fn export_json_value(&self, backend: &dyn ReadBackend) -> Result<serde_json::Value, Error> {
        Ok(serde_json::Value::Array(self.export_records(backend)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

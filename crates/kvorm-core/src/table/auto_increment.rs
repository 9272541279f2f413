use crate::{
    encoding::{Entry, EntryCodec, IndexCodec, SeqCodec},
    error::{Error, ErrorKind, ErrorOrigin},
    model::FieldDescriptor,
    store::{Backend, BatchWriter, EntryDebugger, ReadBackend},
    table::{
        AnyTable, SaveMode, TableOptions, build::table_descriptor, engine::Table, json,
    },
    traits::Message,
    value::Value,
};
use derive_more::Deref;
use serde_json::{Map, Value as JsonValue};
use std::{any::Any, fmt};

/// Genesis key carrying the sequence value an import starts from.
const START_KEY: &str = "$start";

///
/// AutoIncrementTable
///
/// A table whose single `uint64` primary key is assigned from a per-table
/// sequence. Read and index operations come from the wrapped [`Table`].
///

#[derive(Deref)]
pub struct AutoIncrementTable<M> {
    #[deref]
    table: Table<M>,
    pk_field: &'static FieldDescriptor,
}

impl<M: Message> fmt::Debug for AutoIncrementTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoIncrementTable")
            .field("table", &self.table)
            .field("id_field", &self.pk_field.name)
            .finish()
    }
}

impl<M: Message> AutoIncrementTable<M> {
    pub fn build(options: TableOptions<M>) -> Result<Self, Error> {
        let descriptor = table_descriptor(&options)?;
        if !descriptor.primary_key.auto_increment {
            return Err(Error::invalid_table(format!(
                "{} does not declare an auto-increment primary key",
                M::MESSAGE_NAME
            )));
        }

        let table = Table::from_descriptor(&options.prefix, &descriptor, options.json_validator)?;
        let pk_field = table
            .primary
            .key_codec()
            .fields()
            .first()
            .copied()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::MissingPrimaryKey,
                    ErrorOrigin::Table,
                    format!("{} declares no primary key fields", M::MESSAGE_NAME),
                )
            })?;

        Ok(Self { table, pk_field })
    }

    /// The wrapped table, for index and iterator access.
    #[must_use]
    pub const fn table(&self) -> &Table<M> {
        &self.table
    }

    /// Insert `message` under a freshly assigned id, which is written back
    /// into the message and returned. The id must be unset.
    pub fn insert(&self, backend: &dyn Backend, message: &mut M) -> Result<u64, Error> {
        self.save(backend, message, SaveMode::Insert)
    }

    /// Update the record with `message`'s id. The id must be set.
    pub fn update(&self, backend: &dyn Backend, message: &M) -> Result<(), Error> {
        if self.id_of(message)? == 0 {
            return Err(Self::error(
                ErrorKind::InvalidAutoIncrementKey,
                "an update needs a non-zero id",
            ));
        }

        self.table.save(backend, message, SaveMode::Update)
    }

    /// Insert when the id is zero, otherwise update. Returns the id.
    pub fn save(&self, backend: &dyn Backend, message: &mut M, mode: SaveMode) -> Result<u64, Error> {
        let id = self.id_of(message)?;
        if id != 0 {
            if mode == SaveMode::Insert {
                return Err(Self::error(
                    ErrorKind::AutoIncrementKeyAlreadySet,
                    &format!("id {id} is already set; inserts assign their own id"),
                ));
            }
            self.table.save(backend, message, SaveMode::Update)?;

            return Ok(id);
        }
        if mode == SaveMode::Update {
            return Err(Self::error(
                ErrorKind::InvalidAutoIncrementKey,
                "an update needs a non-zero id",
            ));
        }

        let batch = BatchWriter::new(backend);
        let next = self.next_sequence(&batch)?;
        message.set(self.pk_field, Value::Uint64(next))?;
        if let Err(err) = self.table.save_into(&batch, message, SaveMode::Insert) {
            message.clear(self.pk_field)?;
            return Err(err);
        }
        batch.write()?;

        tracing::debug!(table = M::MESSAGE_NAME, id = next, "assigned auto-increment id");

        Ok(next)
    }

    /// Id assigned by the most recent insert, or zero.
    pub fn last_inserted_sequence(&self, backend: &dyn ReadBackend) -> Result<u64, Error> {
        let seq = self.seq_codec()?;

        match backend.index_store_reader().get(seq.prefix())? {
            Some(value) => SeqCodec::<M>::decode_value(&value),
            None => Ok(0),
        }
    }

    fn next_sequence(&self, batch: &BatchWriter<'_>) -> Result<u64, Error> {
        let current = self.last_inserted_sequence(batch)?;
        let next = current.checked_add(1).ok_or_else(|| {
            Error::corruption(
                ErrorOrigin::Table,
                format!("{} sequence is exhausted", M::MESSAGE_NAME),
            )
        })?;
        self.set_sequence(batch, next)?;

        Ok(next)
    }

    fn set_sequence(&self, backend: &dyn Backend, seq: u64) -> Result<(), Error> {
        let codec = self.seq_codec()?;

        backend
            .index_store()
            .set(codec.prefix(), &SeqCodec::<M>::encode_value(seq))
    }

    fn seq_codec(&self) -> Result<&SeqCodec<M>, Error> {
        self.table.seq.as_ref().ok_or_else(|| {
            Error::invalid_table(format!("{} has no auto-increment sequence", M::MESSAGE_NAME))
        })
    }

    fn id_of(&self, message: &M) -> Result<u64, Error> {
        match message.get(self.pk_field) {
            Some(Value::Uint64(id)) => Ok(id),
            _ => Err(Self::error(
                ErrorKind::InvalidAutoIncrementKey,
                &format!("field {} does not hold a uint64 id", self.pk_field.name),
            )),
        }
    }

    fn error(kind: ErrorKind, message: &str) -> Error {
        Error::new(kind, ErrorOrigin::Table, format!("{}: {message}", M::MESSAGE_NAME))
    }

    // Splits an optional leading `{"$start": n}` off the records.
    fn split_start(json: &JsonValue) -> Result<(Option<u64>, &[JsonValue]), Error> {
        let records = json::records::<M>(json)?;
        let Some((JsonValue::Object(first), rest)) = records.split_first() else {
            return Ok((None, records));
        };
        let Some(start) = first.get(START_KEY) else {
            return Ok((None, records));
        };
        if first.len() != 1 {
            return Err(Error::json_validation(format!(
                "{}: {START_KEY} must be the only key of its element",
                M::MESSAGE_NAME
            )));
        }
        let start = start.as_u64().ok_or_else(|| {
            Error::json_validation(format!(
                "{}: {START_KEY} must be an unsigned integer, got {}",
                M::MESSAGE_NAME,
                json::kind_of(start)
            ))
        })?;

        Ok((Some(start), rest))
    }

    fn check_explicit_id(&self, message: &M, start: u64) -> Result<u64, Error> {
        let id = self.id_of(message)?;
        if id > start {
            return Err(Self::error(
                ErrorKind::InvalidAutoIncrementKey,
                &format!("id {id} is above the sequence start {start}"),
            ));
        }

        Ok(id)
    }
}

impl<M: Message> EntryCodec<M> for AutoIncrementTable<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        self.table.decode_entry(key, value)
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        self.table.encode_entry(entry)
    }
}

impl<M: Message> EntryDebugger for AutoIncrementTable<M> {
    fn debug_entry(&self, key: &[u8], value: &[u8]) -> Result<String, Error> {
        self.table.debug_entry(key, value)
    }
}

impl<M: Message> AnyTable for AutoIncrementTable<M> {
    fn message_name(&self) -> &'static str {
        M::MESSAGE_NAME
    }

    fn id(&self) -> u32 {
        self.table.id()
    }

    fn prefix(&self) -> &[u8] {
        self.table.prefix()
    }

    fn default_json_value(&self) -> JsonValue {
        JsonValue::Array(Vec::new())
    }

    fn validate_json_value(&self, json: &JsonValue) -> Result<(), Error> {
        let (start, records) = Self::split_start(json)?;
        let start = start.unwrap_or(0);
        for item in records {
            let message = json::decode_record(item, self.table.json_validator.as_ref())?;
            self.check_explicit_id(&message, start)?;
        }

        Ok(())
    }

    fn import_json_value(&self, backend: &dyn Backend, json: &JsonValue) -> Result<(), Error> {
        let (start, records) = Self::split_start(json)?;
        if let Some(start) = start {
            self.set_sequence(backend, start)?;
        }
        let start = start.unwrap_or(0);

        for item in records {
            let mut message = json::decode_record(item, self.table.json_validator.as_ref())?;
            if self.check_explicit_id(&message, start)? == 0 {
                self.save(backend, &mut message, SaveMode::Insert)?;
            } else {
                self.table.save(backend, &message, SaveMode::Insert)?;
            }
        }

        Ok(())
    }

    fn export_json_value(&self, backend: &dyn ReadBackend) -> Result<JsonValue, Error> {
        let seq = self.last_inserted_sequence(backend)?;
        let mut header = Map::new();
        header.insert(START_KEY.to_string(), JsonValue::from(seq));

        let mut out = vec![JsonValue::Object(header)];
        out.extend(self.table.export_records(backend)?);

        Ok(JsonValue::Array(out))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

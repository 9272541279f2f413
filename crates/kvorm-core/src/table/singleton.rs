use crate::{
    encoding::{
        Entry, EntryCodec, PrimaryKeyEntry,
        entry::{check_table_name, wrong_variant},
    },
    error::{Error, ErrorOrigin},
    obs::sink::{MetricsEvent, SaveKind, record},
    serialize::{deserialize, serialize},
    store::{Backend, BatchWriter, EntryDebugger, ReadBackend},
    table::{AnyTable, JsonValidator, TableOptions, build::table_prefix, json},
    traits::Message,
};
use serde_json::Value as JsonValue;
use std::{any::Any, fmt, marker::PhantomData};

///
/// SingletonTable
///
/// Holds at most one message, stored directly under the table prefix.
/// Reading an empty singleton yields the default message.
///

pub struct SingletonTable<M> {
    id: u32,
    prefix: Vec<u8>,
    json_validator: Option<JsonValidator<M>>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> fmt::Debug for SingletonTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonTable")
            .field("name", &M::MESSAGE_NAME)
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl<M: Message> SingletonTable<M> {
    pub fn build(options: TableOptions<M>) -> Result<Self, Error> {
        let Some(descriptor) = options.resolved_singleton_descriptor() else {
            return Err(Error::invalid_table(format!(
                "missing singleton descriptor for {}",
                M::MESSAGE_NAME
            )));
        };
        if options.table_descriptor.is_some() || M::table_descriptor().is_some() {
            return Err(Error::invalid_table(format!(
                "{} declares both a table and a singleton",
                M::MESSAGE_NAME
            )));
        }

        Ok(Self {
            id: descriptor.id,
            prefix: table_prefix::<M>(&options.prefix, descriptor.id)?,
            json_validator: options.json_validator,
            _marker: PhantomData,
        })
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// The one key this table writes.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// The stored message, or the default message when none is stored.
    pub fn get(&self, backend: &dyn ReadBackend) -> Result<M, Error> {
        match backend.commitment_store_reader().get(&self.prefix)? {
            Some(bytes) => Ok(deserialize(&bytes)?),
            None => Ok(M::default()),
        }
    }

    pub fn has(&self, backend: &dyn ReadBackend) -> Result<bool, Error> {
        backend.commitment_store_reader().has(&self.prefix)
    }

    pub fn save(&self, backend: &dyn Backend, message: &M) -> Result<(), Error> {
        let batch = BatchWriter::new(backend);
        let existing = batch
            .commitment_store_reader()
            .get(&self.prefix)?
            .map(|bytes| deserialize::<M>(&bytes))
            .transpose()?;

        if let Some(hooks) = batch.hooks() {
            match &existing {
                Some(old) => hooks.on_update(old, message)?,
                None => hooks.on_insert(message)?,
            }
        }

        let kind = if existing.is_some() {
            SaveKind::Update
        } else {
            SaveKind::Insert
        };
        batch.commitment_store().set(&self.prefix, &serialize(message)?)?;

        if let Some(hooks) = batch.parent().write_hooks() {
            let new = message.clone();
            match existing {
                Some(old) => batch.enqueue_hook(move || hooks.on_update(&old, &new)),
                None => batch.enqueue_hook(move || hooks.on_insert(&new)),
            }
        }
        batch.write()?;

        tracing::debug!(table = M::MESSAGE_NAME, ?kind, "singleton saved");
        record(MetricsEvent::Save {
            table: M::MESSAGE_NAME,
            kind,
        });

        Ok(())
    }

    /// Remove the stored message. A no-op when none is stored.
    pub fn delete(&self, backend: &dyn Backend) -> Result<(), Error> {
        let batch = BatchWriter::new(backend);
        let Some(bytes) = batch.commitment_store_reader().get(&self.prefix)? else {
            return Ok(());
        };
        let message: M = deserialize(&bytes)?;

        if let Some(hooks) = batch.hooks() {
            hooks.on_delete(&message)?;
        }
        batch.commitment_store().delete(&self.prefix)?;
        if let Some(hooks) = batch.parent().write_hooks() {
            batch.enqueue_hook(move || hooks.on_delete(&message));
        }
        batch.write()?;

        record(MetricsEvent::Delete {
            table: M::MESSAGE_NAME,
            rows: 1,
        });

        Ok(())
    }

    fn decode_json(&self, json: &JsonValue) -> Result<Option<M>, Error> {
        match json {
            JsonValue::Null => Ok(None),
            JsonValue::Object(_) => json::decode_record(json, self.json_validator.as_ref()).map(Some),
            other => Err(Error::json_validation(format!(
                "{} expects a JSON object, got {}",
                M::MESSAGE_NAME,
                json::kind_of(other)
            ))),
        }
    }
}

impl<M: Message> EntryCodec<M> for SingletonTable<M> {
    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<Entry<M>, Error> {
        if key != self.prefix.as_slice() {
            return Err(Error::unexpected_prefix(
                ErrorOrigin::Table,
                format!("{key:02x?} is not the key of singleton {}", M::MESSAGE_NAME),
            ));
        }

        Ok(Entry::PrimaryKey(PrimaryKeyEntry::new(
            Vec::new(),
            Some(deserialize(value)?),
        )))
    }

    fn encode_entry(&self, entry: &Entry<M>) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let Entry::PrimaryKey(pk) = entry else {
            return Err(wrong_variant("primary key", entry));
        };
        check_table_name(entry)?;
        if !pk.key.is_empty() {
            return Err(Error::bad_decode_entry(format!(
                "singleton {} has no key values",
                M::MESSAGE_NAME
            )));
        }
        let Some(message) = &pk.value else {
            return Err(Error::bad_decode_entry("singleton entry has no value"));
        };

        Ok((self.prefix.clone(), serialize(message)?))
    }
}

impl<M: Message> EntryDebugger for SingletonTable<M> {
    fn debug_entry(&self, key: &[u8], value: &[u8]) -> Result<String, Error> {
        Ok(self.decode_entry(key, value)?.to_string())
    }
}

impl<M: Message> AnyTable for SingletonTable<M> {
    fn message_name(&self) -> &'static str {
        M::MESSAGE_NAME
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn default_json_value(&self) -> JsonValue {
        serde_json::to_value(M::default()).unwrap_or(JsonValue::Null)
    }

    fn validate_json_value(&self, json: &JsonValue) -> Result<(), Error> {
        self.decode_json(json).map(|_| ())
    }

    fn import_json_value(&self, backend: &dyn Backend, json: &JsonValue) -> Result<(), Error> {
        match self.decode_json(json)? {
            Some(message) => self.save(backend, &message),
            None => Ok(()),
        }
    }

    fn export_json_value(&self, backend: &dyn ReadBackend) -> Result<JsonValue, Error> {
        json::encode_record(&self.get(backend)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

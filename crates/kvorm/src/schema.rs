use kvorm_core::{
    encoding::{KeyReader, varint::read_id},
    error::{Error, ErrorKind, ErrorOrigin},
    store::{Backend, EntryDebugger, ReadBackend},
    table::{AnyTable, AutoIncrementTable, SingletonTable, Table, TableOptions, build_table},
    traits::Message,
};
use serde_json::{Map, Value as JsonValue};
use std::{collections::BTreeMap, fmt, io};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("table id {id} is claimed by both {first} and {second}")]
    DuplicateTableId {
        id: u32,
        first: &'static str,
        second: &'static str,
    },

    #[error("message {0} is registered twice")]
    DuplicateMessage(&'static str),

    #[error("message {0} is not registered in this module")]
    NotRegistered(&'static str),

    #[error("message {name} is not registered as a {kind}")]
    WrongTableKind {
        name: &'static str,
        kind: &'static str,
    },

    #[error("key {0:02x?} is outside this module")]
    ForeignKey(Vec<u8>),

    #[error("no table with id {0} in this module")]
    UnknownTableId(u32),

    #[error("genesis names unknown table {0}")]
    UnknownGenesisTable(String),

    #[error("module genesis must be a JSON object")]
    GenesisNotObject,
}

impl SchemaError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTableId { .. } | Self::DuplicateMessage(_) | Self::WrongTableKind { .. } => {
                ErrorKind::InvalidTableDefinition
            }
            Self::NotRegistered(_) => ErrorKind::NotFound,
            Self::ForeignKey(_) | Self::UnknownTableId(_) => ErrorKind::UnexpectedDecodePrefix,
            Self::UnknownGenesisTable(_) | Self::GenesisNotObject => ErrorKind::JsonValidationError,
        }
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::new(err.kind(), ErrorOrigin::Module, err.to_string())
    }
}

///
/// ModuleSchema
///
/// Builder for a [`ModuleDb`]. Every registered table is built under the
/// module prefix; ids and message names must be unique within a module.
///

pub struct ModuleSchema {
    db: ModuleDb,
}

impl ModuleSchema {
    #[must_use]
    pub fn new(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            db: ModuleDb {
                prefix: prefix.into(),
                tables: Vec::new(),
                by_id: BTreeMap::new(),
                by_name: BTreeMap::new(),
            },
        }
    }

    /// Register `M` with the descriptors it declares.
    pub fn register<M: Message>(self) -> Result<Self, Error> {
        self.register_with(TableOptions::<M>::new())
    }

    /// Register `M` with explicit options. The module prefix replaces any
    /// prefix set in `options`.
    pub fn register_with<M: Message>(mut self, options: TableOptions<M>) -> Result<Self, Error> {
        let options = TableOptions {
            prefix: self.db.prefix.clone(),
            ..options
        };
        let table = build_table(options)?;
        self.db.insert(table)?;

        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ModuleDb {
        tracing::debug!(
            prefix = ?self.db.prefix,
            tables = self.db.tables.len(),
            "module schema built"
        );

        self.db
    }
}

impl fmt::Debug for ModuleSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSchema").field("db", &self.db).finish()
    }
}

///
/// ModuleDb
///
/// The tables of one module, sharing one key prefix. Routes raw keys to the
/// owning table and runs genesis over every table in name order.
///

pub struct ModuleDb {
    prefix: Vec<u8>,
    tables: Vec<Box<dyn AnyTable>>,
    by_id: BTreeMap<u32, usize>,
    by_name: BTreeMap<&'static str, usize>,
}

impl ModuleDb {
    fn insert(&mut self, table: Box<dyn AnyTable>) -> Result<(), Error> {
        let (id, name) = (table.id(), table.message_name());
        if self.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateMessage(name).into());
        }
        if let Some(&i) = self.by_id.get(&id) {
            return Err(SchemaError::DuplicateTableId {
                id,
                first: self.tables[i].message_name(),
                second: name,
            }
            .into());
        }

        tracing::debug!(table = name, id, "table registered");
        self.by_id.insert(id, self.tables.len());
        self.by_name.insert(name, self.tables.len());
        self.tables.push(table);

        Ok(())
    }

    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Registered message names, sorted.
    pub fn table_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }

    #[must_use]
    pub fn any_table(&self, name: &str) -> Option<&dyn AnyTable> {
        self.by_name.get(name).map(|&i| self.tables[i].as_ref())
    }

    #[must_use]
    pub fn any_table_by_id(&self, id: u32) -> Option<&dyn AnyTable> {
        self.by_id.get(&id).map(|&i| self.tables[i].as_ref())
    }

    /// The plain table for `M`. Auto-increment tables also answer here,
    /// through the table they wrap.
    pub fn table<M: Message>(&self) -> Result<&Table<M>, Error> {
        let any = self.registered::<M>()?.as_any();
        if let Some(table) = any.downcast_ref::<Table<M>>() {
            return Ok(table);
        }

        any.downcast_ref::<AutoIncrementTable<M>>()
            .map(AutoIncrementTable::table)
            .ok_or_else(|| wrong_kind::<M>("table"))
    }

    pub fn auto_increment_table<M: Message>(&self) -> Result<&AutoIncrementTable<M>, Error> {
        self.registered::<M>()?
            .as_any()
            .downcast_ref()
            .ok_or_else(|| wrong_kind::<M>("auto-increment table"))
    }

    pub fn singleton<M: Message>(&self) -> Result<&SingletonTable<M>, Error> {
        self.registered::<M>()?
            .as_any()
            .downcast_ref()
            .ok_or_else(|| wrong_kind::<M>("singleton"))
    }

    fn registered<M: Message>(&self) -> Result<&dyn AnyTable, Error> {
        self.any_table(M::MESSAGE_NAME)
            .ok_or_else(|| SchemaError::NotRegistered(M::MESSAGE_NAME).into())
    }

    /// The table that owns `key`.
    pub fn route_key(&self, key: &[u8]) -> Result<&dyn AnyTable, Error> {
        let mut r = KeyReader::new(key);
        if !r.skip_prefix(&self.prefix) {
            return Err(SchemaError::ForeignKey(key.to_vec()).into());
        }
        let id = read_id(&mut r).ok_or_else(|| SchemaError::ForeignKey(key.to_vec()))?;

        self.any_table_by_id(id)
            .ok_or_else(|| SchemaError::UnknownTableId(id).into())
    }

    //
    // genesis
    //

    /// Default genesis: one entry per table, keyed by message name.
    #[must_use]
    pub fn default_json_value(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .sorted()
            .map(|(name, table)| (name.to_string(), table.default_json_value()))
            .collect();

        JsonValue::Object(map)
    }

    pub fn validate_json_value(&self, json: &JsonValue) -> Result<(), Error> {
        for (table, value) in self.genesis_sections(json)? {
            table.validate_json_value(value)?;
        }

        Ok(())
    }

    /// Import every section present in `json`. Tables without a section are
    /// left untouched.
    pub fn import_json_value(&self, backend: &dyn Backend, json: &JsonValue) -> Result<(), Error> {
        for (table, value) in self.genesis_sections(json)? {
            table.import_json_value(backend, value)?;
            tracing::debug!(table = table.message_name(), "genesis imported");
        }

        Ok(())
    }

    pub fn export_json_value(&self, backend: &dyn ReadBackend) -> Result<JsonValue, Error> {
        let mut map = Map::new();
        for (name, table) in self.sorted() {
            map.insert(name.to_string(), table.export_json_value(backend)?);
        }

        Ok(JsonValue::Object(map))
    }

    pub fn default_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec_pretty(&self.default_json_value())?)
    }

    pub fn validate_json(&self, reader: &mut dyn io::Read) -> Result<(), Error> {
        self.validate_json_value(&read_json(reader)?)
    }

    pub fn import_json(&self, backend: &dyn Backend, reader: &mut dyn io::Read) -> Result<(), Error> {
        self.import_json_value(backend, &read_json(reader)?)
    }

    pub fn export_json(&self, backend: &dyn ReadBackend, writer: &mut dyn io::Write) -> Result<(), Error> {
        let json = self.export_json_value(backend)?;

        Ok(serde_json::to_writer_pretty(writer, &json)?)
    }

    fn sorted(&self) -> impl Iterator<Item = (&'static str, &dyn AnyTable)> + '_ {
        self.by_name
            .iter()
            .map(|(&name, &i)| (name, self.tables[i].as_ref()))
    }

    // Sections of a module genesis in name order. Unknown names fail the
    // whole document before any table runs.
    fn genesis_sections<'j>(
        &self,
        json: &'j JsonValue,
    ) -> Result<Vec<(&dyn AnyTable, &'j JsonValue)>, Error> {
        let JsonValue::Object(map) = json else {
            return Err(SchemaError::GenesisNotObject.into());
        };
        if let Some(unknown) = map.keys().find(|name| !self.by_name.contains_key(name.as_str())) {
            return Err(SchemaError::UnknownGenesisTable(unknown.clone()).into());
        }

        Ok(self
            .sorted()
            .filter_map(|(name, table)| map.get(name).map(|value| (table, value)))
            .collect())
    }
}

fn wrong_kind<M: Message>(kind: &'static str) -> Error {
    SchemaError::WrongTableKind {
        name: M::MESSAGE_NAME,
        kind,
    }
    .into()
}

fn read_json(reader: &mut dyn io::Read) -> Result<JsonValue, Error> {
    serde_json::from_reader(reader).map_err(|err| {
        Error::new(
            ErrorKind::JsonValidationError,
            ErrorOrigin::Module,
            format!("malformed genesis: {err}"),
        )
    })
}

impl EntryDebugger for ModuleDb {
    fn debug_entry(&self, key: &[u8], value: &[u8]) -> Result<String, Error> {
        self.route_key(key)?.debug_entry(key, value)
    }
}

impl fmt::Debug for ModuleDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDb")
            .field("prefix", &self.prefix)
            .field("tables", &self.by_id)
            .finish()
    }
}

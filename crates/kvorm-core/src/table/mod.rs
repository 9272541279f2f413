//! Module: table
//! Responsibility: keeping a primary record and its secondary indexes
//! consistent across writes, and reading them back through iterators.
//! Does not own: byte layouts (see `encoding`) or physical storage (see `store`).
//! Boundary: every table operation takes the backend it runs against; tables
//! themselves hold no mutable state.

mod auto_increment;
mod build;
mod engine;
mod index;
mod iterator;
mod json;
mod paginate;
mod singleton;


pub use auto_increment::AutoIncrementTable;
pub use engine::Table;
pub use index::{Index, UniqueIndex};
pub use iterator::{Filter, IteratorOptions, TableIterator};
pub use paginate::{Page, PageRequest, PaginationRequest};
pub use singleton::SingletonTable;

use crate::{
    error::Error,
    model::{SingletonDescriptor, TableDescriptor},
    store::{Backend, EntryDebugger, ReadBackend},
    traits::Message,
};
use std::{any::Any, fmt, io, sync::Arc};

///
/// SaveMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SaveMode {
    /// Insert or update, whichever applies.
    #[default]
    Default,
    /// Fail with `PrimaryKeyConstraintViolation` if the record exists.
    Insert,
    /// Fail with `NotFoundOnUpdate` if the record does not exist.
    Update,
}

/// Extra validation run on every message read from genesis JSON.
pub type JsonValidator<M> = Arc<dyn Fn(&M) -> Result<(), Error> + Send + Sync>;

///
/// TableOptions
///
/// Build-time configuration. Descriptors default to the ones the message
/// declares; `prefix` is prepended to every key the table writes.
///

pub struct TableOptions<M> {
    pub prefix: Vec<u8>,
    pub table_descriptor: Option<TableDescriptor>,
    pub singleton_descriptor: Option<SingletonDescriptor>,
    pub json_validator: Option<JsonValidator<M>>,
}

impl<M: Message> TableOptions<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn table_descriptor(mut self, descriptor: TableDescriptor) -> Self {
        self.table_descriptor = Some(descriptor);
        self
    }

    #[must_use]
    pub const fn singleton_descriptor(mut self, descriptor: SingletonDescriptor) -> Self {
        self.singleton_descriptor = Some(descriptor);
        self
    }

    #[must_use]
    pub fn json_validator(
        mut self,
        validator: impl Fn(&M) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Self {
        self.json_validator = Some(Arc::new(validator));
        self
    }

    pub(crate) fn resolved_table_descriptor(&self) -> Option<TableDescriptor> {
        self.table_descriptor.clone().or_else(M::table_descriptor)
    }

    pub(crate) fn resolved_singleton_descriptor(&self) -> Option<SingletonDescriptor> {
        self.singleton_descriptor.or_else(M::singleton_descriptor)
    }
}

impl<M> Default for TableOptions<M> {
    fn default() -> Self {
        Self {
            prefix: Vec::new(),
            table_descriptor: None,
            singleton_descriptor: None,
            json_validator: None,
        }
    }
}

impl<M> fmt::Debug for TableOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("prefix", &self.prefix)
            .field("table_descriptor", &self.table_descriptor)
            .field("singleton_descriptor", &self.singleton_descriptor)
            .field("json_validator", &self.json_validator.is_some())
            .finish()
    }
}

///
/// AnyTable
///
/// Type-erased table, as held by a module registry. Genesis JSON is
/// exchanged as `serde_json::Value`; the reader/writer variants wrap it.
///

pub trait AnyTable: EntryDebugger + Send + Sync {
    fn message_name(&self) -> &'static str;

    fn id(&self) -> u32;

    /// Prefix every key of this table starts with.
    fn prefix(&self) -> &[u8];

    fn default_json_value(&self) -> serde_json::Value;

    fn validate_json_value(&self, json: &serde_json::Value) -> Result<(), Error>;

    fn import_json_value(&self, backend: &dyn Backend, json: &serde_json::Value)
    -> Result<(), Error>;

    fn export_json_value(&self, backend: &dyn ReadBackend) -> Result<serde_json::Value, Error>;

    fn as_any(&self) -> &dyn Any;

    /// Pretty-printed default genesis.
    fn default_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec_pretty(&self.default_json_value())?)
    }

    fn validate_json(&self, reader: &mut dyn io::Read) -> Result<(), Error> {
        let json = json::read_json(reader)?;

        self.validate_json_value(&json)
    }

    fn import_json(&self, backend: &dyn Backend, reader: &mut dyn io::Read) -> Result<(), Error> {
        let json = json::read_json(reader)?;

        self.import_json_value(backend, &json)
    }

    fn export_json(&self, backend: &dyn ReadBackend, writer: &mut dyn io::Write) -> Result<(), Error> {
        let json = self.export_json_value(backend)?;

        Ok(serde_json::to_writer_pretty(writer, &json)?)
    }
}

/// Build whichever table kind the descriptors ask for.
pub fn build_table<M: Message>(options: TableOptions<M>) -> Result<Box<dyn AnyTable>, Error> {
    if options.resolved_singleton_descriptor().is_some() {
        return Ok(Box::new(SingletonTable::build(options)?));
    }
    let auto_increment = options
        .resolved_table_descriptor()
        .is_some_and(|d| d.primary_key.auto_increment);
    if auto_increment {
        return Ok(Box::new(AutoIncrementTable::build(options)?));
    }

    Ok(Box::new(Table::build(options)?))
}

//! Core engine for kvorm: order-preserving key codecs, table and index
//! maintenance over an ordered key-value store, iteration and pagination,
//! and the batching and debugging backends they run against.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod encoding;
pub mod error;
pub mod model;
pub mod obs;
pub mod serialize;
pub mod store;
pub mod table;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Domain vocabulary for declaring messages and working with tables.
///

pub mod prelude {
    pub use crate::{
        error::{Error, ErrorKind},
        model::{FieldDescriptor, FieldKind, FieldNames, SingletonDescriptor, TableDescriptor},
        store::{Backend, ReadBackend},
        table::{
            AnyTable, AutoIncrementTable, IteratorOptions, PageRequest, PaginationRequest,
            SaveMode, SingletonTable, Table, TableOptions,
        },
        traits::Message,
        value::{Duration, Timestamp, Value},
    };
}

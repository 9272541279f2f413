//! ## Crate layout
//! - `core`: the engine (codecs, tables, iterators, backends, observability).
//! - `schema`: module-level registry grouping tables under one key prefix.
//!
//! The `prelude` module carries what application code usually needs to
//! declare messages, register them and read or write tables.

pub use kvorm_core as core;

mod schema;

pub use kvorm_core::{encoding, error, model, obs, serialize, store, table, traits, value};
pub use schema::{ModuleDb, ModuleSchema, SchemaError};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Re-exports
//

pub use kvorm_core::error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{ModuleDb, ModuleSchema};
    pub use kvorm_core::{
        prelude::*,
        store::{DebugBackend, MemoryBackend},
        table::{Page, UniqueIndex},
    };
}

//! Generic CRUD repositories over an in-memory store or a SQLite session.
//! `CrudBase<E>` is the entry point; everything else supports it.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{ensure_table, open_db, open_db_in_memory, PersistenceError};
pub use error::{ConfigurationError, CrudError, CrudResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::descriptor::{EntityDescriptor, FieldDescriptor};
pub use model::entity::{Entity, EntityId, ValidationError};
pub use model::record::{Payload, Record};
pub use model::value::{DefaultValue, FieldType, FieldValue};
pub use repo::backend::{resolve_storage, CrudBackend, StorageKind};
pub use repo::crud::CrudBase;
pub use repo::memory::MemoryBackend;
pub use repo::query::{Filter, Page, DEFAULT_LIST_LIMIT};
pub use repo::sqlite::SqliteBackend;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Storage backend contract and backend selection.
//!
//! # Responsibility
//! - Define the single operation surface both backends implement.
//! - Resolve which backend a dispatcher binds to.
//!
//! # Invariants
//! - A resolved `StorageKind` never changes for a dispatcher instance.
//! - Missing identifiers yield `None`/`false`, never an error.

use crate::error::{ConfigurationError, CrudResult};
use crate::model::entity::{Entity, EntityId};
use crate::model::record::Payload;
use crate::repo::query::{Filter, Page};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Backend kind bound to a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Memory,
    Database,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Database => "database",
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "database" => Ok(Self::Database),
            other => Err(ConfigurationError::UnknownStorageKind(other.to_string())),
        }
    }
}

/// Picks the backend for a dispatcher.
///
/// An explicit selector wins; otherwise a session implies `Database` and no
/// session implies `Memory`.
///
/// # Errors
/// - `ConfigurationError::MissingSession` when `Database` is requested
///   without a session.
pub fn resolve_storage(
    has_session: bool,
    requested: Option<StorageKind>,
) -> Result<StorageKind, ConfigurationError> {
    match (requested, has_session) {
        (Some(StorageKind::Database), false) => Err(ConfigurationError::MissingSession),
        (Some(kind), _) => Ok(kind),
        (None, true) => Ok(StorageKind::Database),
        (None, false) => Ok(StorageKind::Memory),
    }
}

/// Operation surface shared by the in-memory and session-backed stores.
///
/// Domain repositories should build custom queries on `find_by` instead of
/// branching on `storage_kind()`.
pub trait CrudBackend<E: Entity> {
    fn storage_kind(&self) -> StorageKind;

    /// Inserts a new entity and returns its stored state.
    fn create(&mut self, payload: &Payload) -> CrudResult<E>;

    fn get(&self, id: EntityId) -> CrudResult<Option<E>>;

    fn list(&self, page: Page) -> CrudResult<Vec<E>>;

    /// Applies a partial update; `Ok(None)` when `id` does not exist.
    fn update(&mut self, id: EntityId, payload: &Payload) -> CrudResult<Option<E>>;

    /// Returns whether a record was removed.
    fn delete(&mut self, id: EntityId) -> CrudResult<bool>;

    fn count(&self) -> CrudResult<u64>;

    /// Returns entities matching every condition of `filter`.
    fn find_by(&self, filter: &Filter) -> CrudResult<Vec<E>>;
}

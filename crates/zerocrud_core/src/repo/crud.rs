//! CRUD dispatcher over one storage backend.
//!
//! # Responsibility
//! - Resolve the backend once at construction and route every call to it.
//! - Validate pagination arguments and emit per-operation diagnostics.
//!
//! # Invariants
//! - `storage_type()` is fixed for the lifetime of the instance.
//! - The dispatcher never opens, commits, rolls back or closes a session.
//! - Log lines carry metadata only; payload values are never logged.

use crate::error::{ConfigurationError, CrudError, CrudResult};
use crate::model::entity::{Entity, EntityId};
use crate::model::record::Payload;
use crate::repo::backend::{resolve_storage, CrudBackend, StorageKind};
use crate::repo::memory::MemoryBackend;
use crate::repo::query::{Filter, Page};
use crate::repo::sqlite::SqliteBackend;
use log::{debug, error, warn};
use rusqlite::Connection;
use std::time::Instant;

/// Generic CRUD entry point for entity type `E`.
///
/// Domain repositories wrap a `CrudBase` and build custom queries on
/// [`CrudBase::find_by`], which works the same for every backend.
///
/// # Example
/// ```ignore
/// let mut users = CrudBase::<User>::new(None, None)?;
/// let ana = users.create(&Payload::new().set("name", "Ana").set("email", "ana@x.com"))?;
/// assert_eq!(users.storage_type(), StorageKind::Memory);
/// ```
pub struct CrudBase<'conn, E: Entity> {
    backend: Box<dyn CrudBackend<E> + 'conn>,
}

impl<'conn, E: Entity + 'conn> CrudBase<'conn, E> {
    /// Builds a dispatcher from an optional session and backend selector.
    ///
    /// # Errors
    /// - `ConfigurationError::MissingSession` when `Database` is requested
    ///   without a session.
    /// - `ConfigurationError::InvalidDescriptor` when `E`'s descriptor is
    ///   malformed.
    pub fn new(
        session: Option<&'conn Connection>,
        storage: Option<StorageKind>,
    ) -> Result<Self, ConfigurationError> {
        let kind = resolve_storage(session.is_some(), storage)?;
        let backend: Box<dyn CrudBackend<E> + 'conn> = match (kind, session) {
            (StorageKind::Database, Some(conn)) => Box::new(SqliteBackend::<E>::try_new(conn)?),
            (StorageKind::Database, None) => return Err(ConfigurationError::MissingSession),
            (StorageKind::Memory, _) => {
                check_descriptor::<E>()?;
                Box::new(MemoryBackend::<E>::new())
            }
        };

        debug!(
            "event=crud_init module=repo status=ok storage={} entity={} session={}",
            kind,
            E::descriptor().table,
            session.is_some()
        );
        Ok(Self { backend })
    }

    pub fn in_memory() -> Result<Self, ConfigurationError> {
        Self::new(None, Some(StorageKind::Memory))
    }

    pub fn with_session(conn: &'conn Connection) -> Result<Self, ConfigurationError> {
        Self::new(Some(conn), Some(StorageKind::Database))
    }

    /// Wraps a custom backend implementation.
    pub fn from_backend(backend: Box<dyn CrudBackend<E> + 'conn>) -> Self {
        Self { backend }
    }

    pub fn storage_type(&self) -> StorageKind {
        self.backend.storage_kind()
    }

    /// Read access to the bound backend.
    pub fn backend(&self) -> &dyn CrudBackend<E> {
        self.backend.as_ref()
    }

    /// Creates a new entity from `payload`.
    ///
    /// # Errors
    /// - `CrudError::Validation` when the payload does not fit the descriptor.
    /// - `CrudError::Persistence` when the session rejects the write.
    pub fn create(&mut self, payload: &Payload) -> CrudResult<E> {
        let started_at = Instant::now();
        let result = self.backend.create(payload);
        self.trace("crud_create", started_at, &result, |entity| {
            format!("id={} fields={}", entity.id(), payload.len())
        });
        result
    }

    /// Returns the entity with `id`, or `None`.
    pub fn get(&self, id: EntityId) -> CrudResult<Option<E>> {
        let started_at = Instant::now();
        let result = self.backend.get(id);
        self.trace("crud_get", started_at, &result, |found| {
            format!("id={id} found={}", found.is_some())
        });
        result
    }

    /// Returns at most `limit` entities after skipping `skip`.
    ///
    /// Memory order is insertion order. Database order is backend-defined.
    ///
    /// # Errors
    /// - `CrudError::InvalidArgument` when `skip` or `limit` is negative.
    pub fn list(&self, skip: i64, limit: i64) -> CrudResult<Vec<E>> {
        let started_at = Instant::now();
        let result = Page::new(skip, limit).and_then(|page| self.backend.list(page));
        self.trace("crud_list", started_at, &result, |entities| {
            format!("skip={skip} limit={limit} returned={}", entities.len())
        });
        result
    }

    /// Lists with a pre-validated page, e.g. `Page::default()`.
    pub fn list_page(&self, page: Page) -> CrudResult<Vec<E>> {
        let started_at = Instant::now();
        let result = self.backend.list(page);
        self.trace("crud_list", started_at, &result, |entities| {
            format!(
                "skip={} limit={} returned={}",
                page.skip(),
                page.limit(),
                entities.len()
            )
        });
        result
    }

    /// Applies a partial update; `None` when `id` does not exist.
    pub fn update(&mut self, id: EntityId, payload: &Payload) -> CrudResult<Option<E>> {
        let started_at = Instant::now();
        let result = self.backend.update(id, payload);
        self.trace("crud_update", started_at, &result, |updated| {
            format!(
                "id={id} fields={} found={}",
                payload.len(),
                updated.is_some()
            )
        });
        result
    }

    /// Removes the entity with `id`; `false` when it was already absent.
    pub fn delete(&mut self, id: EntityId) -> CrudResult<bool> {
        let started_at = Instant::now();
        let result = self.backend.delete(id);
        self.trace("crud_delete", started_at, &result, |removed| {
            format!("id={id} removed={removed}")
        });
        result
    }

    pub fn count(&self) -> CrudResult<u64> {
        let started_at = Instant::now();
        let result = self.backend.count();
        self.trace("crud_count", started_at, &result, |total| {
            format!("total={total}")
        });
        result
    }

    /// Returns entities matching every condition in `filter`.
    pub fn find_by(&self, filter: &Filter) -> CrudResult<Vec<E>> {
        let started_at = Instant::now();
        let result = self.backend.find_by(filter);
        self.trace("crud_find_by", started_at, &result, |entities| {
            format!("returned={}", entities.len())
        });
        result
    }

    fn trace<T>(
        &self,
        event: &str,
        started_at: Instant,
        result: &CrudResult<T>,
        detail: impl FnOnce(&T) -> String,
    ) {
        let storage = self.storage_type();
        let entity = E::descriptor().table;
        let duration_ms = started_at.elapsed().as_millis();
        match result {
            Ok(value) => debug!(
                "event={event} module=repo status=ok storage={storage} entity={entity} {} duration_ms={duration_ms}",
                detail(value)
            ),
            Err(err) if matches!(err, CrudError::Persistence(_)) => error!(
                "event={event} module=repo status=error storage={storage} entity={entity} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
            Err(err) => warn!(
                "event={event} module=repo status=rejected storage={storage} entity={entity} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
        }
    }
}

fn check_descriptor<E: Entity>() -> Result<(), ConfigurationError> {
    let descriptor = E::descriptor();
    descriptor
        .check()
        .map_err(|reason| ConfigurationError::InvalidDescriptor {
            entity: descriptor.table,
            reason,
        })
}

//! In-memory storage backend.
//!
//! # Responsibility
//! - Keep entities in insertion order with O(1) lookup by identifier.
//! - Assign identifiers from a per-store counter.
//!
//! # Invariants
//! - Identifiers start at 1, only increase, and are never reused after
//!   deletion within one store.
//! - A caller-supplied identifier below the counter is replaced by the
//!   counter value; one at or above it is kept and the counter jumps past it.
//! - No I/O; nothing here is shared across threads without external locking.

use crate::error::{CrudError, CrudResult};
use crate::model::entity::{Entity, EntityId};
use crate::model::record::Payload;
use crate::model::value::FieldValue;
use crate::repo::backend::{CrudBackend, StorageKind};
use crate::repo::query::{Filter, Page};
use indexmap::IndexMap;

/// First identifier handed out by a fresh store.
pub const FIRST_ID: EntityId = 1;

/// Insertion-ordered entity store.
#[derive(Debug, Clone)]
pub struct MemoryBackend<E: Entity> {
    records: IndexMap<EntityId, E>,
    next_id: EntityId,
}

impl<E: Entity> MemoryBackend<E> {
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
            next_id: FIRST_ID,
        }
    }

    /// Identifier the next auto-assigned create will receive.
    pub fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Resolves the identifier for a create without touching the counter.
    fn resolve_id(&self, requested: Option<EntityId>) -> CrudResult<(EntityId, EntityId)> {
        let id = match requested {
            Some(id) if id >= self.next_id => id,
            _ => self.next_id,
        };
        let next_id = id.checked_add(1).ok_or_else(|| {
            CrudError::InvalidArgument(format!("identifier {id} exhausts the id space"))
        })?;
        Ok((id, next_id))
    }
}

impl<E: Entity> Default for MemoryBackend<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> CrudBackend<E> for MemoryBackend<E> {
    fn storage_kind(&self) -> StorageKind {
        StorageKind::Memory
    }

    fn create(&mut self, payload: &Payload) -> CrudResult<E> {
        let descriptor = E::descriptor();
        let values = descriptor.validate_create(payload)?;
        let (id, next_id) = self.resolve_id(values.id)?;

        // A rejected record must not consume an identifier.
        let entity = E::from_record(&descriptor.complete(id, values.fields))?;
        self.next_id = next_id;
        self.records.insert(id, entity.clone());
        Ok(entity)
    }

    fn get(&self, id: EntityId) -> CrudResult<Option<E>> {
        Ok(self.records.get(&id).cloned())
    }

    fn list(&self, page: Page) -> CrudResult<Vec<E>> {
        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(self
            .records
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    fn update(&mut self, id: EntityId, payload: &Payload) -> CrudResult<Option<E>> {
        let changes = E::descriptor().validate_update(payload)?;
        let Some(existing) = self.records.get_mut(&id) else {
            return Ok(None);
        };

        let mut record = existing.to_record();
        for (field, value) in changes {
            record.set(field, value);
        }
        let updated = E::from_record(&record)?;
        *existing = updated.clone();
        Ok(Some(updated))
    }

    fn delete(&mut self, id: EntityId) -> CrudResult<bool> {
        Ok(self.records.shift_remove(&id).is_some())
    }

    fn count(&self) -> CrudResult<u64> {
        Ok(self.records.len() as u64)
    }

    fn find_by(&self, filter: &Filter) -> CrudResult<Vec<E>> {
        let descriptor = E::descriptor();
        let conditions = descriptor.validate_conditions(filter.conditions())?;

        Ok(self
            .records
            .values()
            .filter(|entity| {
                let record = entity.to_record();
                conditions.iter().all(|(field, expected)| {
                    if *field == descriptor.id_field {
                        return *expected == FieldValue::Integer(record.id());
                    }
                    record.get(field).unwrap_or(&FieldValue::Null) == expected
                })
            })
            .cloned()
            .collect())
    }
}

//! Partial payloads and full entity records.
//!
//! # Responsibility
//! - `Payload` carries caller-supplied field changes for create/update.
//! - `Record` carries one complete entity state for conversion into `E`.
//!
//! # Invariants
//! - A `Record` always has an identifier.
//! - Typed accessors never coerce between types, except integer-to-real.

use super::entity::{EntityId, ValidationError};
use super::value::{FieldType, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Explicit partial mapping from field name to value.
///
/// Absent keys mean "not provided"; `FieldValue::Null` means "set to null".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    fields: BTreeMap<String, FieldValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (field, value) in iter {
            payload.insert(field, value);
        }
        payload
    }
}

/// Complete field state of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: EntityId,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl Record {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment, used by `Entity::to_record`.
    pub fn with(mut self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &'static str, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn text(&self, field: &str) -> Result<String, ValidationError> {
        required(field, self.opt_text(field)?)
    }

    pub fn opt_text(&self, field: &str) -> Result<Option<String>, ValidationError> {
        match self.lookup(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(value) => Ok(Some(value.clone())),
            other => Err(mismatch(field, FieldType::Text, other)),
        }
    }

    pub fn integer(&self, field: &str) -> Result<i64, ValidationError> {
        required(field, self.opt_integer(field)?)
    }

    pub fn opt_integer(&self, field: &str) -> Result<Option<i64>, ValidationError> {
        match self.lookup(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(value) => Ok(Some(*value)),
            other => Err(mismatch(field, FieldType::Integer, other)),
        }
    }

    pub fn real(&self, field: &str) -> Result<f64, ValidationError> {
        required(field, self.opt_real(field)?)
    }

    pub fn opt_real(&self, field: &str) -> Result<Option<f64>, ValidationError> {
        match self.lookup(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Real(value) => Ok(Some(*value)),
            FieldValue::Integer(value) => Ok(Some(*value as f64)),
            other => Err(mismatch(field, FieldType::Real, other)),
        }
    }

    pub fn boolean(&self, field: &str) -> Result<bool, ValidationError> {
        required(field, self.opt_boolean(field)?)
    }

    pub fn opt_boolean(&self, field: &str) -> Result<Option<bool>, ValidationError> {
        match self.lookup(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Boolean(value) => Ok(Some(*value)),
            other => Err(mismatch(field, FieldType::Boolean, other)),
        }
    }

    fn lookup(&self, field: &str) -> Result<&FieldValue, ValidationError> {
        self.fields
            .get(field)
            .ok_or_else(|| ValidationError::MissingField {
                field: field.to_string(),
            })
    }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::NullNotAllowed {
        field: field.to_string(),
    })
}

fn mismatch(field: &str, expected: FieldType, found: &FieldValue) -> ValidationError {
    ValidationError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.type_name(),
    }
}

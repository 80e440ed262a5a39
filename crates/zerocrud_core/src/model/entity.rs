//! Entity capability contract.
//!
//! # Responsibility
//! - Describe what a consumer record type must provide to be stored.
//! - Define the validation error shared by payload checks and record decoding.
//!
//! # Invariants
//! - `Entity::id()` is stable for the lifetime of a stored entity.
//! - `from_record(&e.to_record())` reproduces `e`.

use super::descriptor::EntityDescriptor;
use super::record::Record;
use super::value::FieldType;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Synthetic identifier assigned by the store.
pub type EntityId = i64;

/// Capability set required by `CrudBase<E>`.
///
/// Implementors expose a static descriptor, an identifier, and conversions
/// to and from a full [`Record`].
pub trait Entity: Clone {
    fn descriptor() -> &'static EntityDescriptor;

    fn id(&self) -> EntityId;

    /// Builds an entity from a complete record.
    fn from_record(record: &Record) -> Result<Self, ValidationError>;

    fn to_record(&self) -> Record;
}

/// Payload or record shape does not match the entity descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownField {
        field: String,
    },
    MissingField {
        field: String,
    },
    NullNotAllowed {
        field: String,
    },
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },
    IdNotUpdatable {
        field: String,
    },
    NonFiniteReal {
        field: String,
    },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownField { field }
            | Self::MissingField { field }
            | Self::NullNotAllowed { field }
            | Self::TypeMismatch { field, .. }
            | Self::IdNotUpdatable { field }
            | Self::NonFiniteReal { field } => field,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { field } => write!(f, "unknown field `{field}`"),
            Self::MissingField { field } => write!(f, "missing required field `{field}`"),
            Self::NullNotAllowed { field } => write!(f, "field `{field}` cannot be null"),
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` expects {expected}, got {found}"),
            Self::IdNotUpdatable { field } => {
                write!(f, "identifier field `{field}` cannot be updated")
            }
            Self::NonFiniteReal { field } => {
                write!(f, "field `{field}` must be a finite number")
            }
        }
    }
}

impl Error for ValidationError {}

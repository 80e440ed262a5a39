//! Error taxonomy for dispatcher construction and CRUD calls.
//!
//! # Invariants
//! - Lookups that find nothing are never errors.
//! - Persistence failures keep their original cause reachable via `source()`.

use crate::db::PersistenceError;
use crate::model::entity::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CrudResult<T> = Result<T, CrudError>;

/// Invalid or inconsistent backend configuration. Fatal, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    MissingSession,
    UnknownStorageKind(String),
    InvalidDescriptor { entity: &'static str, reason: String },
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSession => write!(f, "Database backend requires a session"),
            Self::UnknownStorageKind(value) => write!(
                f,
                "unknown storage kind `{value}`; expected memory|database"
            ),
            Self::InvalidDescriptor { entity, reason } => {
                write!(f, "invalid descriptor for `{entity}`: {reason}")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// Error returned by every dispatcher and backend operation.
#[derive(Debug)]
pub enum CrudError {
    Configuration(ConfigurationError),
    Validation(ValidationError),
    InvalidArgument(String),
    Persistence(PersistenceError),
}

impl CrudError {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Validation(_) => "validation_error",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

impl Display for CrudError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CrudError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidArgument(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for CrudError {
    fn from(value: ConfigurationError) -> Self {
        Self::Configuration(value)
    }
}

impl From<ValidationError> for CrudError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for CrudError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for CrudError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Sqlite(value))
    }
}

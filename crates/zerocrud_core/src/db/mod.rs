//! SQLite session bootstrap and persistence errors.
//!
//! # Responsibility
//! - Open and configure SQLite connections used as database sessions.
//! - Create entity tables from descriptors.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Nothing in this module commits or rolls back caller transactions.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{create_table_sql, ensure_table, quote_identifier};

pub type DbResult<T> = Result<T, PersistenceError>;

/// Failure raised by, or decoded from, the database session.
#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    InvalidData(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

//! Storage backends and the CRUD dispatcher.
//!
//! # Responsibility
//! - Define one backend contract with an in-memory and a SQLite session
//!   implementation.
//! - Expose `CrudBase`, the dispatcher consumers build repositories on.
//!
//! # Invariants
//! - Both backends validate payloads through the same entity descriptor.
//! - Missing identifiers produce `None`/`false`, never `NotFound` errors.

pub mod backend;
pub mod crud;
pub mod memory;
pub mod query;
pub mod sqlite;

//! Storage-neutral entity model.
//!
//! # Responsibility
//! - Define the capability contract every stored entity implements.
//! - Describe entity layout statically and validate payloads against it.
//!
//! # Invariants
//! - Every stored entity is identified by an integer `EntityId`.
//! - Payload validation is identical for every backend.

pub mod descriptor;
pub mod entity;
pub mod record;
pub mod value;

//! Pagination and equality filters shared by all backends.

use crate::error::{CrudError, CrudResult};
use crate::model::value::FieldValue;

/// Default page size for `list`.
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Validated offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    skip: u64,
    limit: u64,
}

impl Page {
    /// Validates raw pagination arguments.
    ///
    /// # Errors
    /// - `CrudError::InvalidArgument` when `skip` or `limit` is negative.
    pub fn new(skip: i64, limit: i64) -> CrudResult<Self> {
        Ok(Self {
            skip: non_negative("skip", skip)?,
            limit: non_negative("limit", limit)?,
        })
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

fn non_negative(name: &str, value: i64) -> CrudResult<u64> {
    u64::try_from(value).map_err(|_| {
        CrudError::InvalidArgument(format!("`{name}` must be non-negative, got {value}"))
    })
}

/// Conjunction of null-safe equality conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, FieldValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new().and(field, value)
    }

    pub fn and(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.conditions
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }
}

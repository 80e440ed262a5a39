//! Static entity descriptors and payload shape validation.
//!
//! # Responsibility
//! - Declare table, identifier and field layout for an entity type.
//! - Validate create/update payloads and filter conditions against it.
//!
//! # Invariants
//! - Table and field names are plain SQL identifiers; they are interpolated
//!   into SQL text, values never are.
//! - A field is required on create iff it is non-nullable without default.

use super::entity::{EntityId, ValidationError};
use super::record::{Payload, Record};
use super::value::{DefaultValue, FieldType, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const DEFAULT_ID_FIELD: &str = "id";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Declaration of one non-identifier field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldType) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            default: None,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub const fn real(name: &'static str) -> Self {
        Self::new(name, FieldType::Real)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn with_default(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    /// Required fields must be present in a create payload.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none()
    }

    /// Value used when a create payload omits this field.
    pub fn fallback_value(&self) -> FieldValue {
        self.default.map_or(FieldValue::Null, DefaultValue::to_value)
    }

    /// Checks one value against this declaration.
    ///
    /// Integers are widened for real columns; nothing else is coerced.
    /// NaN and infinities are rejected.
    pub fn check(&self, value: &FieldValue) -> Result<FieldValue, ValidationError> {
        match (self.kind, value) {
            (_, FieldValue::Null) if self.nullable => Ok(FieldValue::Null),
            (_, FieldValue::Null) => Err(ValidationError::NullNotAllowed {
                field: self.name.to_string(),
            }),
            (FieldType::Real, FieldValue::Real(raw)) if !raw.is_finite() => {
                Err(ValidationError::NonFiniteReal {
                    field: self.name.to_string(),
                })
            }
            (FieldType::Integer, FieldValue::Integer(_))
            | (FieldType::Real, FieldValue::Real(_))
            | (FieldType::Text, FieldValue::Text(_))
            | (FieldType::Boolean, FieldValue::Boolean(_)) => Ok(value.clone()),
            (FieldType::Real, FieldValue::Integer(raw)) => Ok(FieldValue::Real(*raw as f64)),
            (expected, found) => Err(ValidationError::TypeMismatch {
                field: self.name.to_string(),
                expected,
                found: found.type_name(),
            }),
        }
    }
}

/// Table-level layout of an entity type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityDescriptor {
    pub table: &'static str,
    pub id_field: &'static str,
    pub fields: &'static [FieldDescriptor],
}

/// Validated create payload: optional caller id plus provided fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateValues {
    pub id: Option<EntityId>,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl EntityDescriptor {
    pub const fn new(table: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            table,
            id_field: DEFAULT_ID_FIELD,
            fields,
        }
    }

    pub const fn with_id_field(self, id_field: &'static str) -> Self {
        Self { id_field, ..self }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks the declaration itself.
    ///
    /// Returns a human-readable reason when the descriptor is unusable.
    pub fn check(&self) -> Result<(), String> {
        check_identifier("table", self.table)?;
        check_identifier("id field", self.id_field)?;

        let mut seen = BTreeSet::new();
        for field in self.fields {
            check_identifier("field", field.name)?;
            if field.name.eq_ignore_ascii_case(self.id_field) {
                return Err(format!(
                    "field `{}` collides with identifier field",
                    field.name
                ));
            }
            if !seen.insert(field.name.to_ascii_lowercase()) {
                return Err(format!("duplicate field `{}`", field.name));
            }
            if let Some(default) = field.default {
                let compatible = default.kind() == field.kind
                    || (field.kind == FieldType::Real && default.kind() == FieldType::Integer);
                if !compatible {
                    return Err(format!(
                        "default for field `{}` is {}, expected {}",
                        field.name,
                        default.kind(),
                        field.kind
                    ));
                }
                if let DefaultValue::Real(value) = default {
                    if !value.is_finite() {
                        return Err(format!(
                            "default for field `{}` must be finite, got {value}",
                            field.name
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Validates a create payload.
    ///
    /// Fields are checked in payload order, then required fields are checked
    /// in declaration order.
    pub fn validate_create(&self, payload: &Payload) -> Result<CreateValues, ValidationError> {
        let mut id = None;
        let mut fields = Vec::with_capacity(payload.len());

        for (name, value) in payload.iter() {
            if name == self.id_field {
                id = self.check_id(value)?;
                continue;
            }
            let field = self.known_field(name)?;
            fields.push((field.name, field.check(value)?));
        }

        if let Some(missing) = self
            .fields
            .iter()
            .find(|field| field.is_required() && !payload.contains(field.name))
        {
            return Err(ValidationError::MissingField {
                field: missing.name.to_string(),
            });
        }

        Ok(CreateValues { id, fields })
    }

    /// Validates a partial update payload. The identifier cannot change.
    pub fn validate_update(
        &self,
        payload: &Payload,
    ) -> Result<Vec<(&'static str, FieldValue)>, ValidationError> {
        payload
            .iter()
            .map(|(name, value)| {
                if name == self.id_field {
                    return Err(ValidationError::IdNotUpdatable {
                        field: name.to_string(),
                    });
                }
                let field = self.known_field(name)?;
                Ok((field.name, field.check(value)?))
            })
            .collect()
    }

    /// Validates equality conditions. Null is accepted for any field.
    pub fn validate_conditions<'a>(
        &self,
        conditions: impl IntoIterator<Item = (&'a str, &'a FieldValue)>,
    ) -> Result<Vec<(&'static str, FieldValue)>, ValidationError> {
        conditions
            .into_iter()
            .map(|(name, value)| {
                if name == self.id_field {
                    return match value {
                        FieldValue::Null | FieldValue::Integer(_) => {
                            Ok((self.id_field, value.clone()))
                        }
                        other => Err(ValidationError::TypeMismatch {
                            field: name.to_string(),
                            expected: FieldType::Integer,
                            found: other.type_name(),
                        }),
                    };
                }
                let field = self.known_field(name)?;
                if value.is_null() {
                    return Ok((field.name, FieldValue::Null));
                }
                Ok((field.name, field.check(value)?))
            })
            .collect()
    }

    /// Builds a full record from validated create values, filling omitted
    /// fields with their default or null.
    pub fn complete(&self, id: EntityId, provided: Vec<(&'static str, FieldValue)>) -> Record {
        let mut record = Record::new(id);
        for field in self.fields {
            record.set(field.name, field.fallback_value());
        }
        for (name, value) in provided {
            record.set(name, value);
        }
        record
    }

    fn known_field(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        self.field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                field: name.to_string(),
            })
    }

    fn check_id(&self, value: &FieldValue) -> Result<Option<EntityId>, ValidationError> {
        match value {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(id) => Ok(Some(*id)),
            other => Err(ValidationError::TypeMismatch {
                field: self.id_field.to_string(),
                expected: FieldType::Integer,
                found: other.type_name(),
            }),
        }
    }
}

fn check_identifier(role: &str, name: &str) -> Result<(), String> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(format!("{role} name `{name}` is not a plain identifier"))
    }
}

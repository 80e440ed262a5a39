//! Entity table bootstrap from static descriptors.
//!
//! # Responsibility
//! - Render `CREATE TABLE IF NOT EXISTS` DDL for an entity descriptor.
//! - Apply it on a caller-owned connection.
//!
//! # Invariants
//! - The identifier column is `INTEGER PRIMARY KEY AUTOINCREMENT`, so deleted
//!   identifiers are never handed out again.
//! - Every table and column name is emitted through `quote_identifier`.
//! - Existing tables are left untouched; there is no column diffing.

use crate::error::{ConfigurationError, CrudResult};
use crate::model::descriptor::{EntityDescriptor, FieldDescriptor};
use crate::model::value::{DefaultValue, FieldType};
use log::info;
use rusqlite::Connection;

/// Returns the DDL used by [`ensure_table`].
pub fn create_table_sql(descriptor: &EntityDescriptor) -> Result<String, ConfigurationError> {
    descriptor
        .check()
        .map_err(|reason| ConfigurationError::InvalidDescriptor {
            entity: descriptor.table,
            reason,
        })?;

    let mut columns = vec![format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote_identifier(descriptor.id_field)
    )];
    columns.extend(descriptor.fields.iter().map(column_sql));

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        quote_identifier(descriptor.table),
        columns.join(",\n    ")
    ))
}

/// Quotes a table or column name for SQLite, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Creates the entity table when it does not exist yet.
pub fn ensure_table(conn: &Connection, descriptor: &EntityDescriptor) -> CrudResult<()> {
    let sql = create_table_sql(descriptor)?;
    conn.execute_batch(&sql)?;
    info!(
        "event=ensure_table module=db status=ok table={} columns={}",
        descriptor.table,
        descriptor.fields.len() + 1
    );
    Ok(())
}

fn column_sql(field: &FieldDescriptor) -> String {
    let mut sql = format!("{} {}", quote_identifier(field.name), column_type(field.kind));
    if !field.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = field.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_literal(default));
    }
    sql
}

fn column_type(kind: FieldType) -> &'static str {
    match kind {
        FieldType::Integer | FieldType::Boolean => "INTEGER",
        FieldType::Real => "REAL",
        FieldType::Text => "TEXT",
    }
}

fn default_literal(default: DefaultValue) -> String {
    match default {
        DefaultValue::Integer(value) => value.to_string(),
        DefaultValue::Real(value) => format!("{value:?}"),
        DefaultValue::Text(value) => format!("'{}'", value.replace('\'', "''")),
        DefaultValue::Boolean(value) => String::from(if value { "1" } else { "0" }),
    }
}

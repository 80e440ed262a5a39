//! Session-backed storage over a caller-owned SQLite connection.
//!
//! # Responsibility
//! - Translate backend operations into SQL against the entity table.
//! - Re-read written rows so database-assigned values reach the caller.
//!
//! # Invariants
//! - Never begins, commits or rolls back a transaction; statements run in
//!   whatever transaction state the borrowed connection is in.
//! - Only descriptor identifiers are interpolated into SQL, always quoted;
//!   all values are bound parameters.
//! - Rows that fail entity decoding are reported, never skipped.

use crate::db::{quote_identifier, PersistenceError};
use crate::error::{ConfigurationError, CrudResult};
use crate::model::descriptor::{EntityDescriptor, FieldDescriptor};
use crate::model::entity::{Entity, EntityId};
use crate::model::record::{Payload, Record};
use crate::model::value::{FieldType, FieldValue};
use crate::repo::backend::{CrudBackend, StorageKind};
use crate::repo::query::{Filter, Page};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::marker::PhantomData;

/// Storage backend bound to a borrowed SQLite session.
pub struct SqliteBackend<'conn, E: Entity> {
    conn: &'conn Connection,
    table_sql: String,
    id_sql: String,
    select_sql: String,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteBackend<'conn, E> {
    /// Binds the backend to `conn` after checking the entity descriptor.
    ///
    /// The entity table must already exist (see `db::ensure_table`).
    pub fn try_new(conn: &'conn Connection) -> Result<Self, ConfigurationError> {
        let descriptor = E::descriptor();
        descriptor
            .check()
            .map_err(|reason| ConfigurationError::InvalidDescriptor {
                entity: descriptor.table,
                reason,
            })?;

        let table_sql = quote_identifier(descriptor.table);
        let id_sql = quote_identifier(descriptor.id_field);
        let columns = std::iter::once(id_sql.clone())
            .chain(descriptor.fields.iter().map(|field| quote_identifier(field.name)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            conn,
            select_sql: format!("SELECT {columns} FROM {table_sql}"),
            table_sql,
            id_sql,
            _entity: PhantomData,
        })
    }

    fn descriptor(&self) -> &'static EntityDescriptor {
        E::descriptor()
    }

    fn fetch(&self, id: EntityId) -> CrudResult<Option<E>> {
        let sql = format!("{} WHERE {} = ?1;", self.select_sql, self.id_sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entity_row(row, self.descriptor())?));
        }
        Ok(None)
    }

    fn query_entities(&self, sql: &str, bind_values: Vec<Value>) -> CrudResult<Vec<E>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entities = Vec::new();

        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row(row, self.descriptor())?);
        }

        Ok(entities)
    }
}

impl<E: Entity> CrudBackend<E> for SqliteBackend<'_, E> {
    fn storage_kind(&self) -> StorageKind {
        StorageKind::Database
    }

    fn create(&mut self, payload: &Payload) -> CrudResult<E> {
        let descriptor = self.descriptor();
        let values = descriptor.validate_create(payload)?;

        let mut columns = Vec::with_capacity(values.fields.len() + 1);
        let mut bind_values = Vec::with_capacity(values.fields.len() + 1);
        if let Some(id) = values.id {
            columns.push(self.id_sql.clone());
            bind_values.push(Value::Integer(id));
        }
        for (name, value) in &values.fields {
            columns.push(quote_identifier(name));
            bind_values.push(to_sql_value(value));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES;", self.table_sql)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                self.table_sql,
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };
        self.conn.execute(&sql, params_from_iter(bind_values))?;

        let id = self.conn.last_insert_rowid();
        self.fetch(id)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "row {id} not visible in `{}` after insert",
                descriptor.table
            ))
            .into()
        })
    }

    fn get(&self, id: EntityId) -> CrudResult<Option<E>> {
        self.fetch(id)
    }

    fn list(&self, page: Page) -> CrudResult<Vec<E>> {
        let sql = format!(
            "{} ORDER BY {} LIMIT ? OFFSET ?;",
            self.select_sql, self.id_sql
        );
        self.query_entities(
            &sql,
            vec![
                Value::Integer(to_sql_count(page.limit())),
                Value::Integer(to_sql_count(page.skip())),
            ],
        )
    }

    fn update(&mut self, id: EntityId, payload: &Payload) -> CrudResult<Option<E>> {
        let descriptor = self.descriptor();
        let changes = descriptor.validate_update(payload)?;
        if changes.is_empty() {
            return self.fetch(id);
        }

        let assignments = changes
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_identifier(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut bind_values: Vec<Value> =
            changes.iter().map(|(_, value)| to_sql_value(value)).collect();
        bind_values.push(Value::Integer(id));

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {assignments} WHERE {} = ?;",
                self.table_sql, self.id_sql
            ),
            params_from_iter(bind_values),
        )?;

        if changed == 0 {
            return Ok(None);
        }

        self.fetch(id)
    }

    fn delete(&mut self, id: EntityId) -> CrudResult<bool> {
        let changed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1;",
                self.table_sql, self.id_sql
            ),
            params![id],
        )?;
        Ok(changed > 0)
    }

    fn count(&self) -> CrudResult<u64> {
        let table = self.descriptor().table;
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", self.table_sql),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(total).map_err(|_| {
            PersistenceError::InvalidData(format!("negative row count {total} for `{table}`"))
                .into()
        })
    }

    fn find_by(&self, filter: &Filter) -> CrudResult<Vec<E>> {
        let conditions = self.descriptor().validate_conditions(filter.conditions())?;

        let mut sql = self.select_sql.clone();
        let mut bind_values = Vec::with_capacity(conditions.len());
        if !filter.is_empty() {
            // `IS` matches NULL the same way the memory store does.
            let predicates = conditions
                .iter()
                .map(|(field, _)| format!("{} IS ?", quote_identifier(field)))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&predicates);
            bind_values.extend(conditions.iter().map(|(_, value)| to_sql_value(value)));
        }
        sql.push_str(&format!(" ORDER BY {};", self.id_sql));

        self.query_entities(&sql, bind_values)
    }
}

fn parse_entity_row<E: Entity>(row: &Row<'_>, descriptor: &EntityDescriptor) -> CrudResult<E> {
    let id: EntityId = row.get(0)?;
    let mut record = Record::new(id);
    for (offset, field) in descriptor.fields.iter().enumerate() {
        record.set(field.name, read_column(row, offset + 1, field, descriptor)?);
    }

    E::from_record(&record).map_err(|err| {
        PersistenceError::InvalidData(format!("row {id} in `{}`: {err}", descriptor.table)).into()
    })
}

fn read_column(
    row: &Row<'_>,
    index: usize,
    field: &FieldDescriptor,
    descriptor: &EntityDescriptor,
) -> CrudResult<FieldValue> {
    let value = match field.kind {
        FieldType::Integer => row.get::<_, Option<i64>>(index)?.map(FieldValue::Integer),
        FieldType::Real => row.get::<_, Option<f64>>(index)?.map(FieldValue::Real),
        FieldType::Text => row.get::<_, Option<String>>(index)?.map(FieldValue::Text),
        FieldType::Boolean => match row.get::<_, Option<i64>>(index)? {
            None => None,
            Some(0) => Some(FieldValue::Boolean(false)),
            Some(1) => Some(FieldValue::Boolean(true)),
            Some(other) => {
                return Err(PersistenceError::InvalidData(format!(
                    "invalid boolean value `{other}` in {}.{}",
                    descriptor.table, field.name
                ))
                .into());
            }
        },
    };

    match value {
        Some(value) => Ok(value),
        None if field.nullable => Ok(FieldValue::Null),
        None => Err(PersistenceError::InvalidData(format!(
            "null in non-nullable column {}.{}",
            descriptor.table, field.name
        ))
        .into()),
    }
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(value) => Value::Integer(*value),
        FieldValue::Real(value) => Value::Real(*value),
        FieldValue::Text(value) => Value::Text(value.clone()),
        FieldValue::Boolean(value) => Value::Integer(i64::from(*value)),
    }
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#![allow(dead_code)]

use rusqlite::Connection;
use zerocrud_core::{
    ensure_table, open_db_in_memory, DefaultValue, Entity, EntityDescriptor, EntityId,
    FieldDescriptor, Payload, Record, ValidationError,
};

static USER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("name"),
    FieldDescriptor::text("email"),
    FieldDescriptor::boolean("active").with_default(DefaultValue::Boolean(true)),
    FieldDescriptor::text("nickname").nullable(),
    FieldDescriptor::real("rating").nullable(),
];

static USER_DESCRIPTOR: EntityDescriptor = EntityDescriptor::new("users", USER_FIELDS);

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub nickname: Option<String>,
    pub rating: Option<f64>,
}

impl Entity for User {
    fn descriptor() -> &'static EntityDescriptor {
        &USER_DESCRIPTOR
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, ValidationError> {
        Ok(Self {
            id: record.id(),
            name: record.text("name")?,
            email: record.text("email")?,
            active: record.boolean("active")?,
            nickname: record.opt_text("nickname")?,
            rating: record.opt_real("rating")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(self.id)
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
            .with("active", self.active)
            .with("nickname", self.nickname.clone())
            .with("rating", self.rating)
    }
}

pub fn user_payload(name: &str, email: &str) -> Payload {
    Payload::new().set("name", name).set("email", email)
}

/// In-memory SQLite session with the `users` table in place.
pub fn sqlite_session() -> Connection {
    let conn = open_db_in_memory().unwrap();
    ensure_table(&conn, User::descriptor()).unwrap();
    conn
}

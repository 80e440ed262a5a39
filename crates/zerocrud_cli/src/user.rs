//! Demo `users` entity and its domain repository.

use zerocrud_core::{
    CrudBase, CrudResult, DefaultValue, Entity, EntityDescriptor, EntityId, FieldDescriptor,
    Filter, Payload, Record, ValidationError,
};

static USER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("name"),
    FieldDescriptor::text("email"),
    FieldDescriptor::boolean("active").with_default(DefaultValue::Boolean(true)),
];

static USER_DESCRIPTOR: EntityDescriptor = EntityDescriptor::new("users", USER_FIELDS);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub active: bool,
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
        })
    }

    fn to_record(&self) -> Record {
        Record::new(self.id)
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
            .with("active", self.active)
    }
}

/// User lookups layered on the generic dispatcher.
pub struct UserRepository<'conn> {
    crud: CrudBase<'conn, User>,
}

impl<'conn> UserRepository<'conn> {
    pub fn new(crud: CrudBase<'conn, User>) -> Self {
        Self { crud }
    }

    pub fn crud(&self) -> &CrudBase<'conn, User> {
        &self.crud
    }

    pub fn crud_mut(&mut self) -> &mut CrudBase<'conn, User> {
        &mut self.crud
    }

    pub fn register(&mut self, name: &str, email: &str) -> CrudResult<User> {
        self.crud
            .create(&Payload::new().set("name", name).set("email", email))
    }

    /// First user with `email`, if any.
    pub fn find_by_email(&self, email: &str) -> CrudResult<Option<User>> {
        Ok(self
            .crud
            .find_by(&Filter::eq("email", email))?
            .into_iter()
            .next())
    }
}

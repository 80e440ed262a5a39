mod common;

use common::{sqlite_session, user_payload, User};
use std::cell::Cell;
use std::rc::Rc;
use zerocrud_core::{
    ConfigurationError, CrudBackend, CrudBase, CrudResult, Entity, EntityDescriptor, EntityId,
    FieldDescriptor, Filter, MemoryBackend, Page, Payload, Record, StorageKind, ValidationError,
};

#[test]
fn no_session_and_no_selector_resolves_memory() {
    let crud = CrudBase::<User>::new(None, None).unwrap();
    assert_eq!(crud.storage_type(), StorageKind::Memory);
}

#[test]
fn session_without_selector_resolves_database() {
    let conn = sqlite_session();
    let crud = CrudBase::<User>::new(Some(&conn), None).unwrap();
    assert_eq!(crud.storage_type(), StorageKind::Database);
    assert_eq!(crud.backend().storage_kind(), StorageKind::Database);
}

#[test]
fn database_selector_without_session_is_a_configuration_error() {
    let result = CrudBase::<User>::new(None, Some(StorageKind::Database));
    let err = result.err().unwrap();

    assert_eq!(err, ConfigurationError::MissingSession);
    assert_eq!(err.to_string(), "Database backend requires a session");
}

#[test]
fn memory_selector_ignores_the_session() {
    let conn = sqlite_session();
    let mut crud = CrudBase::<User>::new(Some(&conn), Some(StorageKind::Memory)).unwrap();
    assert_eq!(crud.storage_type(), StorageKind::Memory);

    crud.create(&user_payload("Ana", "ana@x.com")).unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn storage_selector_parses_from_configuration_text() {
    let kind: StorageKind = "memory".parse().unwrap();
    let crud = CrudBase::<User>::new(None, Some(kind)).unwrap();
    assert_eq!(crud.storage_type(), StorageKind::Memory);

    let kind: StorageKind = serde_json::from_str("\"database\"").unwrap();
    assert_eq!(kind, StorageKind::Database);
}

static BROKEN_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("title"),
    FieldDescriptor::text("title"),
];

static BROKEN_DESCRIPTOR: EntityDescriptor = EntityDescriptor::new("broken", BROKEN_FIELDS);

#[derive(Debug, Clone, PartialEq)]
struct Broken {
    id: EntityId,
}

impl Entity for Broken {
    fn descriptor() -> &'static EntityDescriptor {
        &BROKEN_DESCRIPTOR
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self, ValidationError> {
        Ok(Self { id: record.id() })
    }

    fn to_record(&self) -> Record {
        Record::new(self.id)
    }
}

#[test]
fn malformed_descriptor_is_rejected_for_every_backend() {
    let conn = sqlite_session();

    for storage in [StorageKind::Memory, StorageKind::Database] {
        let err = CrudBase::<Broken>::new(Some(&conn), Some(storage))
            .err()
            .unwrap();
        assert!(
            matches!(
                err,
                ConfigurationError::InvalidDescriptor { entity: "broken", ref reason }
                    if reason.contains("duplicate")
            ),
            "storage={storage} err={err}"
        );
    }
}

/// Counts writes while delegating storage to a memory backend.
struct CountingBackend {
    inner: MemoryBackend<User>,
    writes: Rc<Cell<usize>>,
}

impl CrudBackend<User> for CountingBackend {
    fn storage_kind(&self) -> StorageKind {
        self.inner.storage_kind()
    }

    fn create(&mut self, payload: &Payload) -> CrudResult<User> {
        self.writes.set(self.writes.get() + 1);
        self.inner.create(payload)
    }

    fn get(&self, id: EntityId) -> CrudResult<Option<User>> {
        self.inner.get(id)
    }

    fn list(&self, page: Page) -> CrudResult<Vec<User>> {
        self.inner.list(page)
    }

    fn update(&mut self, id: EntityId, payload: &Payload) -> CrudResult<Option<User>> {
        self.writes.set(self.writes.get() + 1);
        self.inner.update(id, payload)
    }

    fn delete(&mut self, id: EntityId) -> CrudResult<bool> {
        self.writes.set(self.writes.get() + 1);
        self.inner.delete(id)
    }

    fn count(&self) -> CrudResult<u64> {
        self.inner.count()
    }

    fn find_by(&self, filter: &Filter) -> CrudResult<Vec<User>> {
        self.inner.find_by(filter)
    }
}

#[test]
fn custom_backend_receives_every_call() {
    let writes = Rc::new(Cell::new(0));
    let mut crud = CrudBase::<User>::from_backend(Box::new(CountingBackend {
        inner: MemoryBackend::new(),
        writes: Rc::clone(&writes),
    }));

    let ana = crud.create(&user_payload("Ana", "ana@x.com")).unwrap();
    crud.update(ana.id, &Payload::new().set("nickname", "an"))
        .unwrap();
    crud.delete(ana.id).unwrap();

    assert_eq!(writes.get(), 3);
    assert_eq!(crud.storage_type(), StorageKind::Memory);
    assert_eq!(crud.count().unwrap(), 0);
}

/// Domain repository built on the generic dispatcher.
struct UserRepository<'conn> {
    crud: CrudBase<'conn, User>,
}

impl<'conn> UserRepository<'conn> {
    fn new(crud: CrudBase<'conn, User>) -> Self {
        Self { crud }
    }

    fn register(&mut self, name: &str, email: &str) -> CrudResult<User> {
        self.crud.create(&user_payload(name, email))
    }

    fn find_by_email(&self, email: &str) -> CrudResult<Option<User>> {
        Ok(self
            .crud
            .find_by(&Filter::eq("email", email))?
            .into_iter()
            .next())
    }

    fn active(&self) -> CrudResult<Vec<User>> {
        self.crud.find_by(&Filter::eq("active", true))
    }
}

fn exercise_repository(mut users: UserRepository<'_>) {
    let ana = users.register("Ana", "ana@x.com").unwrap();
    let bo = users.register("Bo", "bo@x.com").unwrap();
    users
        .crud
        .update(bo.id, &Payload::new().set("active", false))
        .unwrap();

    assert_eq!(users.find_by_email("ana@x.com").unwrap(), Some(ana.clone()));
    assert_eq!(users.find_by_email("nobody@x.com").unwrap(), None);
    assert_eq!(users.active().unwrap(), vec![ana]);
}

#[test]
fn domain_repository_behaves_the_same_on_both_backends() {
    exercise_repository(UserRepository::new(CrudBase::in_memory().unwrap()));

    let conn = sqlite_session();
    exercise_repository(UserRepository::new(
        CrudBase::with_session(&conn).unwrap(),
    ));
}

#[test]
fn payload_deserializes_from_json() {
    let payload: Payload = serde_json::from_str(
        r#"{"name": "Ana", "email": "ana@x.com", "active": false, "nickname": null}"#,
    )
    .unwrap();
    let mut crud = CrudBase::<User>::in_memory().unwrap();

    let user = crud.create(&payload).unwrap();

    assert_eq!(user.name, "Ana");
    assert!(!user.active);
    assert_eq!(user.nickname, None);
}

#[test]
fn validation_errors_leave_the_dispatcher_usable() {
    let mut crud = CrudBase::<User>::in_memory().unwrap();

    let err = crud
        .create(&Payload::new().set("name", 3).set("email", "x@x.com"))
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");

    let user = crud.create(&user_payload("Ana", "ana@x.com")).unwrap();
    assert_eq!(user.id, 1);
}

mod common;

use common::{sqlite_session, user_payload, User};
use rusqlite::Connection;
use std::error::Error;
use zerocrud_core::{
    ensure_table, open_db, open_db_in_memory, CrudBase, CrudError, Entity, Payload,
    PersistenceError, StorageKind,
};

#[test]
fn create_reads_back_database_assigned_values() {
    let conn = sqlite_session();
    let mut crud = CrudBase::<User>::with_session(&conn).unwrap();

    let user = crud.create(&user_payload("Ana", "ana@x.com")).unwrap();

    assert_eq!(user.id, 1);
    assert!(user.active, "DEFAULT 1 should be visible after insert");
    assert_eq!(user.nickname, None);
}

#[test]
fn deleted_ids_are_not_reused() {
    let conn = sqlite_session();
    let mut crud = CrudBase::<User>::with_session(&conn).unwrap();

    let first = crud.create(&user_payload("A", "a@test.com")).unwrap();
    let second = crud.create(&user_payload("B", "b@test.com")).unwrap();
    crud.delete(second.id).unwrap();
    let third = crud.create(&user_payload("C", "c@test.com")).unwrap();

    assert_eq!((first.id, second.id, third.id), (1, 2, 3));
}

#[test]
fn explicit_id_is_inserted_as_given() {
    let conn = sqlite_session();
    let mut crud = CrudBase::<User>::with_session(&conn).unwrap();

    let user = crud
        .create(&user_payload("User100", "user100@test.com").set("id", 100))
        .unwrap();
    assert_eq!(user.id, 100);

    let next = crud.create(&user_payload("Next", "next@test.com")).unwrap();
    assert_eq!(next.id, 101);
}

#[test]
fn constraint_violation_surfaces_as_persistence_error_with_cause() {
    let conn = sqlite_session();
    let mut crud = CrudBase::<User>::with_session(&conn).unwrap();
    crud.create(&user_payload("Ana", "ana@x.com").set("id", 5))
        .unwrap();

    let err = crud
        .create(&user_payload("Dup", "dup@x.com").set("id", 5))
        .unwrap_err();

    assert_eq!(err.code(), "persistence_error");
    let CrudError::Persistence(persistence) = &err else {
        panic!("unexpected error: {err}");
    };
    assert!(matches!(persistence, PersistenceError::Sqlite(_)));
    let cause = err.source().and_then(|source| source.source()).unwrap();
    assert!(cause.to_string().contains("UNIQUE") || cause.to_string().contains("PRIMARY"));
    assert_eq!(crud.count().unwrap(), 1);
}

#[test]
fn missing_table_surfaces_as_persistence_error() {
    let conn = open_db_in_memory().unwrap();
    let mut crud = CrudBase::<User>::with_session(&conn).unwrap();

    assert!(matches!(crud.count(), Err(CrudError::Persistence(_))));
    assert!(matches!(
        crud.create(&user_payload("Ana", "ana@x.com")),
        Err(CrudError::Persistence(_))
    ));
    assert!(matches!(crud.get(1), Err(CrudError::Persistence(_))));
}

#[test]
fn undecodable_rows_are_reported_not_skipped() {
    let conn = sqlite_session();
    conn.execute(
        "INSERT INTO users (name, email, active) VALUES ('Ana', 'ana@x.com', 7);",
        [],
    )
    .unwrap();
    let crud = CrudBase::<User>::with_session(&conn).unwrap();

    let err = crud.list(0, 10).unwrap_err();
    assert!(matches!(
        err,
        CrudError::Persistence(PersistenceError::InvalidData(ref message)) if message.contains("users.active")
    ));
}

#[test]
fn caller_rollback_discards_dispatcher_writes() {
    let mut conn = sqlite_session();

    let tx = conn.transaction().unwrap();
    {
        let mut crud = CrudBase::<User>::with_session(&tx).unwrap();
        let user = crud.create(&user_payload("Ana", "ana@x.com")).unwrap();
        assert_eq!(crud.get(user.id).unwrap().unwrap().name, "Ana");
        assert_eq!(crud.count().unwrap(), 1);
    }
    tx.rollback().unwrap();

    let crud = CrudBase::<User>::with_session(&conn).unwrap();
    assert_eq!(crud.count().unwrap(), 0);
}

#[test]
fn caller_commit_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zerocrud.db");

    {
        let mut conn = open_db(&path).unwrap();
        ensure_table(&conn, User::descriptor()).unwrap();
        let tx = conn.transaction().unwrap();
        {
            let mut crud = CrudBase::<User>::new(Some(&*tx), None).unwrap();
            assert_eq!(crud.storage_type(), StorageKind::Database);
            crud.create(&user_payload("Ana", "ana@x.com")).unwrap();
            crud.create(&user_payload("Bo", "bo@x.com")).unwrap();
        }
        tx.commit().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let crud = CrudBase::<User>::with_session(&conn).unwrap();
    let names: Vec<_> = crud
        .list(0, 10)
        .unwrap()
        .into_iter()
        .map(|user| user.name)
        .collect();
    assert_eq!(names, vec!["Ana", "Bo"]);
}

#[test]
fn update_reflects_row_state_after_write() {
    let conn = sqlite_session();
    let mut crud = CrudBase::<User>::with_session(&conn).unwrap();
    let user = crud.create(&user_payload("Ana", "ana@x.com")).unwrap();

    let updated = crud
        .update(
            user.id,
            &Payload::new().set("active", false).set("nickname", "an"),
        )
        .unwrap()
        .unwrap();

    assert!(!updated.active);
    assert_eq!(updated.nickname.as_deref(), Some("an"));

    let stored_active: i64 = conn
        .query_row("SELECT active FROM users WHERE id = ?1;", [user.id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored_active, 0);
}

#[test]
fn rows_written_outside_the_dispatcher_are_visible() {
    let conn = sqlite_session();
    insert_raw(&conn, "Raw", "raw@x.com");
    let crud = CrudBase::<User>::with_session(&conn).unwrap();

    let user = crud.get(1).unwrap().unwrap();
    assert_eq!(user.name, "Raw");
    assert!(user.active);
    assert_eq!(crud.count().unwrap(), 1);
}

fn insert_raw(conn: &Connection, name: &str, email: &str) {
    conn.execute(
        "INSERT INTO users (name, email) VALUES (?1, ?2);",
        [name, email],
    )
    .unwrap();
}

use rollcall_core::db::open_db_in_memory;
use rollcall_core::{DirectoryError, PersonDirectory, SchemaError, SqlitePersonDirectory};
use rusqlite::Connection;
use uuid::Uuid;

fn seed_person(conn: &Connection, name: &str, department: Option<&str>) -> Uuid {
    let uuid = Uuid::new_v4();
    conn.execute(
        "INSERT INTO people (uuid, display_name, department) VALUES (?1, ?2, ?3);",
        rusqlite::params![uuid.to_string(), name, department],
    )
    .unwrap();
    uuid
}

#[test]
fn find_by_token_resolves_exact_match_only() {
    let conn = open_db_in_memory().unwrap();
    let ada = seed_person(&conn, "Ada", Some("physics"));
    seed_person(&conn, "Bea", None);
    let directory = SqlitePersonDirectory::try_new(&conn).unwrap();

    let found = directory
        .find_by_token(&ada.to_string())
        .unwrap()
        .expect("known token should resolve");
    assert_eq!(found.uuid, ada);
    assert_eq!(found.display_name, "Ada");
    assert_eq!(found.department.as_deref(), Some("physics"));

    // Prefixes and other partial matches never resolve.
    let prefix = &ada.to_string()[..8];
    assert!(directory.find_by_token(prefix).unwrap().is_none());
}

#[test]
fn unknown_token_is_none_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    seed_person(&conn, "Ada", None);
    let directory = SqlitePersonDirectory::try_new(&conn).unwrap();

    let outcome = directory.find_by_token(&Uuid::new_v4().to_string());
    assert!(matches!(outcome, Ok(None)));
}

#[test]
fn count_all_reflects_roster_size() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqlitePersonDirectory::try_new(&conn).unwrap();
    assert_eq!(directory.count_all().unwrap(), 0);

    seed_person(&conn, "Ada", None);
    seed_person(&conn, "Bea", None);
    assert_eq!(directory.count_all().unwrap(), 2);
}

#[test]
fn list_all_orders_by_display_name() {
    let conn = open_db_in_memory().unwrap();
    seed_person(&conn, "Zoe", None);
    seed_person(&conn, "Ada", None);
    seed_person(&conn, "Mia", None);
    let directory = SqlitePersonDirectory::try_new(&conn).unwrap();

    let names: Vec<String> = directory
        .list_all()
        .unwrap()
        .into_iter()
        .map(|person| person.display_name)
        .collect();
    assert_eq!(names, vec!["Ada", "Mia", "Zoe"]);
}

#[test]
fn directory_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqlitePersonDirectory::try_new(&conn) {
        Err(DirectoryError::Schema(SchemaError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        })) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn corrupt_person_row_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO people (uuid, display_name, department) VALUES ('broken', 'Ghost', NULL);",
        [],
    )
    .unwrap();
    let directory = SqlitePersonDirectory::try_new(&conn).unwrap();

    assert!(matches!(
        directory.find_by_token("broken"),
        Err(DirectoryError::InvalidData(_))
    ));
}

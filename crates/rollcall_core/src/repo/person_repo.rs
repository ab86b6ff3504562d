//! Identity directory contract and SQLite implementation.
//!
//! # Responsibility
//! - Resolve a scanned token to a known person, exact match only.
//! - Expose roster size and roster listing for absence accounting and
//!   history views.
//!
//! # Invariants
//! - Lookup is read-only; this core never writes person rows.
//! - "Token not found" (`Ok(None)`) and "directory unavailable" (`Err`)
//!   are distinct outcomes; callers treat them differently.

use rusqlite::{Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::db::DbError;
use crate::model::person::Person;
use crate::repo::{is_busy, verify_schema, SchemaError};

const PERSON_SELECT_SQL: &str = "SELECT uuid, display_name, department FROM people";

const PEOPLE_REQUIRED_COLUMNS: &[&str] = &["uuid", "display_name", "department"];

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Identity directory failure.
///
/// Deliberately does not include a "not found" variant: an unknown token
/// is a regular `Ok(None)` outcome, not an error of the directory itself.
#[derive(Debug)]
pub enum DirectoryError {
    /// Directory backend cannot be reached or failed mid-query.
    Unavailable(DbError),
    /// Bounded wait on the directory backend expired.
    Timeout,
    /// Persisted person row is corrupt.
    InvalidData(String),
    /// Connection failed repository preflight.
    Schema(SchemaError),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "identity directory unavailable: {err}"),
            Self::Timeout => write!(f, "identity directory timed out"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted person data: {message}")
            }
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Timeout => None,
            Self::InvalidData(_) => None,
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DirectoryError {
    fn from(value: rusqlite::Error) -> Self {
        if is_busy(&value) {
            return Self::Timeout;
        }
        Self::Unavailable(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for DirectoryError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Identity collaborator contract.
pub trait PersonDirectory {
    /// Resolves an already-validated token to a person, exact match only.
    ///
    /// Returns `Ok(None)` when no person carries that token.
    fn find_by_token(&self, token: &str) -> DirectoryResult<Option<Person>>;

    /// Total number of known persons, used for absence accounting.
    fn count_all(&self) -> DirectoryResult<u64>;

    /// Full roster ordered by display name, for roster views.
    fn list_all(&self) -> DirectoryResult<Vec<Person>>;
}

/// SQLite-backed identity directory.
pub struct SqlitePersonDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonDirectory<'conn> {
    /// Wraps a connection after verifying the `people` schema is present.
    pub fn try_new(conn: &'conn Connection) -> DirectoryResult<Self> {
        verify_schema(conn, "people", PEOPLE_REQUIRED_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl PersonDirectory for SqlitePersonDirectory<'_> {
    fn find_by_token(&self, token: &str) -> DirectoryResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([token])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn count_all(&self) -> DirectoryResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM people;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| DirectoryError::InvalidData(format!("negative roster count {count}")))
    }

    fn list_all(&self) -> DirectoryResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY display_name ASC, uuid ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }

        Ok(people)
    }
}

fn parse_person_row(row: &Row<'_>) -> DirectoryResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        DirectoryError::InvalidData(format!("invalid uuid value `{uuid_text}` in people.uuid"))
    })?;

    Ok(Person {
        uuid,
        display_name: row.get("display_name")?,
        department: row.get("department")?,
    })
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define collaborator contracts for identity lookup and the durable
//!   attendance store.
//! - Isolate SQLite query details from service/workflow orchestration.
//!
//! # Invariants
//! - Repository constructors verify the connection schema before use; a
//!   connection without applied migrations is rejected, not papered over.
//! - Repository APIs return semantic outcomes (`AlreadyExists`, `None` for
//!   unknown tokens) in addition to transport errors.

use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::db::migrations::latest_version;
use crate::db::DbError;

pub mod person_repo;
pub mod record_repo;

/// Connection preflight failure shared by repository constructors.
#[derive(Debug)]
pub enum SchemaError {
    /// `PRAGMA user_version` does not match the migrations known by this
    /// binary; the connection was not opened through `db::open_db`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// A required table is absent.
    MissingRequiredTable(&'static str),
    /// A required column is absent from an existing table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    Db(DbError),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table is missing: {table}")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column is missing: {table}.{column}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

/// Verifies that a connection carries the migrated schema expected by a
/// repository before any query runs against it.
pub(crate) fn verify_schema(
    conn: &Connection,
    table: &'static str,
    required_columns: &[&'static str],
) -> Result<(), SchemaError> {
    let actual_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|err| SchemaError::Db(DbError::Sqlite(err)))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(SchemaError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )
        .map_err(|err| SchemaError::Db(DbError::Sqlite(err)))?;
    if table_exists == 0 {
        return Err(SchemaError::MissingRequiredTable(table));
    }

    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .map_err(|err| SchemaError::Db(DbError::Sqlite(err)))?;
    let present: HashSet<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|err| SchemaError::Db(DbError::Sqlite(err)))?
        .collect::<Result<_, _>>()
        .map_err(|err| SchemaError::Db(DbError::Sqlite(err)))?;

    for column in required_columns {
        if !present.contains(*column) {
            return Err(SchemaError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

/// Whether a SQLite failure means "the database was locked longer than the
/// configured busy timeout", i.e. a bounded wait that expired.
pub(crate) fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}

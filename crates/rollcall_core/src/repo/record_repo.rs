//! Attendance store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist attendance records through a single atomic create-if-absent
//!   operation.
//! - Serve per-day and per-person record queries for aggregation and
//!   history views.
//!
//! # Invariants
//! - `create_if_absent` is one statement arbitrated by the store's UNIQUE
//!   constraint on `(person_uuid, day)`; there is no separate existence
//!   check to race against.
//! - Records are write-once: no update or delete exists on this contract.
//! - Read paths reject invalid persisted state instead of masking it.

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::db::DbError;
use crate::model::person::PersonId;
use crate::model::record::{AttendanceRecord, PresenceStatus, RecordDayMismatch};
use crate::repo::{is_busy, verify_schema, SchemaError};

const RECORD_SELECT_SQL: &str = "SELECT
    uuid,
    person_uuid,
    day,
    status,
    operator_uuid,
    recorded_at
FROM attendance_records";

const RECORDS_REQUIRED_COLUMNS: &[&str] = &[
    "uuid",
    "person_uuid",
    "day",
    "status",
    "operator_uuid",
    "recorded_at",
];

const DAY_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable store failure for attendance persistence and queries.
#[derive(Debug)]
pub enum StoreError {
    /// Store backend cannot be reached or failed mid-statement.
    Unavailable(DbError),
    /// Bounded wait on the store expired (database stayed locked).
    Timeout,
    /// Record under write violates model invariants.
    InvalidRecord(RecordDayMismatch),
    /// Persisted row is corrupt.
    InvalidData(String),
    /// Connection failed repository preflight.
    Schema(SchemaError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "attendance store unavailable: {err}"),
            Self::Timeout => write!(f, "attendance store timed out"),
            Self::InvalidRecord(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted attendance data: {message}")
            }
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Timeout => None,
            Self::InvalidRecord(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if is_busy(&value) {
            return Self::Timeout;
        }
        Self::Unavailable(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for StoreError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<RecordDayMismatch> for StoreError {
    fn from(value: RecordDayMismatch) -> Self {
        Self::InvalidRecord(value)
    }
}

/// Outcome of one atomic create-if-absent attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// This attempt won; the record is now persisted.
    Created(AttendanceRecord),
    /// A record for `(person, day)` already existed; nothing was written.
    AlreadyExists,
}

/// Durable store collaborator contract.
pub trait AttendanceStore {
    /// Inserts the record unless one already exists for its
    /// `(person, day)` pair.
    ///
    /// # Contract
    /// - Atomic: under any number of concurrent attempts for the same
    ///   pair, exactly one observes `Created`; all others observe
    ///   `AlreadyExists` with no persisted side effect.
    fn create_if_absent(&self, record: &AttendanceRecord) -> StoreResult<CreateOutcome>;

    /// All records for one calendar day, ordered by recording time.
    fn query_by_day(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceRecord>>;

    /// Most recent records for one person, newest day first.
    fn query_by_person(
        &self,
        person_uuid: PersonId,
        limit: u32,
    ) -> StoreResult<Vec<AttendanceRecord>>;
}

/// SQLite-backed attendance store.
pub struct SqliteAttendanceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceStore<'conn> {
    /// Wraps a connection after verifying the `attendance_records` schema
    /// is present.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        verify_schema(conn, "attendance_records", RECORDS_REQUIRED_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl AttendanceStore for SqliteAttendanceStore<'_> {
    fn create_if_absent(&self, record: &AttendanceRecord) -> StoreResult<CreateOutcome> {
        record.validate()?;

        let changed = self.conn.execute(
            "INSERT INTO attendance_records (
                uuid,
                person_uuid,
                day,
                status,
                operator_uuid,
                recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (person_uuid, day) DO NOTHING;",
            params![
                record.uuid.to_string(),
                record.person_uuid.to_string(),
                record.day.format(DAY_FORMAT).to_string(),
                status_to_db(record.status),
                record.operator_uuid.to_string(),
                record.recorded_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;

        if changed == 0 {
            info!(
                "event=record_create module=store status=duplicate person={} day={}",
                record.person_uuid, record.day
            );
            return Ok(CreateOutcome::AlreadyExists);
        }

        info!(
            "event=record_create module=store status=ok person={} day={} status_value={}",
            record.person_uuid,
            record.day,
            status_to_db(record.status)
        );
        Ok(CreateOutcome::Created(record.clone()))
    }

    fn query_by_day(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE day = ?1
             ORDER BY recorded_at ASC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([day.format(DAY_FORMAT).to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn query_by_person(
        &self,
        person_uuid: PersonId,
        limit: u32,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE person_uuid = ?1
             ORDER BY day DESC
             LIMIT ?2;"
        ))?;

        let mut rows = stmt.query(params![person_uuid.to_string(), i64::from(limit)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<AttendanceRecord> {
    let uuid = parse_uuid_column(row, "uuid")?;
    let person_uuid = parse_uuid_column(row, "person_uuid")?;
    let operator_uuid = parse_uuid_column(row, "operator_uuid")?;

    let day_text: String = row.get("day")?;
    let day = NaiveDate::parse_from_str(&day_text, DAY_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid day value `{day_text}` in attendance_records.day"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid status `{status_text}` in attendance_records.status"
        ))
    })?;

    let recorded_text: String = row.get("recorded_at")?;
    let recorded_at =
        NaiveDateTime::parse_from_str(&recorded_text, TIMESTAMP_FORMAT).map_err(|_| {
            StoreError::InvalidData(format!(
                "invalid timestamp `{recorded_text}` in attendance_records.recorded_at"
            ))
        })?;

    let record = AttendanceRecord {
        uuid,
        person_uuid,
        day,
        status,
        operator_uuid,
        recorded_at,
    };
    record.validate()?;
    Ok(record)
}

fn parse_uuid_column(row: &Row<'_>, column: &'static str) -> StoreResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid uuid value `{text}` in attendance_records.{column}"
        ))
    })
}

fn status_to_db(status: PresenceStatus) -> &'static str {
    match status {
        PresenceStatus::Present => "present",
        PresenceStatus::Late => "late",
        PresenceStatus::Absent => "absent",
    }
}

fn parse_status(value: &str) -> Option<PresenceStatus> {
    match value {
        "present" => Some(PresenceStatus::Present),
        "late" => Some(PresenceStatus::Late),
        "absent" => Some(PresenceStatus::Absent),
        _ => None,
    }
}

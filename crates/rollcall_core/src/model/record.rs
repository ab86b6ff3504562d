//! Scan input and attendance record models.
//!
//! # Responsibility
//! - Define the ephemeral scan event and the durable attendance record.
//! - Validate raw scan input before any collaborator call.
//!
//! # Invariants
//! - `AttendanceRecord` is immutable after creation; there is no update or
//!   delete API anywhere in this crate.
//! - `day` always equals the calendar day of `recorded_at` (local civil
//!   time); read paths reject persisted rows that disagree.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::model::person::PersonId;

/// Stable identifier for one attendance record.
pub type RecordId = Uuid;

/// Stable identifier for the operator who recorded a scan.
pub type OperatorId = Uuid;

/// Presence status derived from the scan timestamp and the configured
/// policy thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Scanned before the present cutoff.
    Present,
    /// Scanned between the present cutoff and the late cutoff.
    Late,
    /// Scanned at or after the late cutoff. Distinct from "no scan at all".
    Absent,
}

/// Validation failure for raw scan input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanValidationError {
    /// Token is empty after trimming.
    BlankToken,
    /// Token is not a canonical UUID string.
    MalformedToken(String),
}

impl Display for ScanValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankToken => write!(f, "scan token must not be blank"),
            Self::MalformedToken(token) => {
                write!(f, "scan token is not a valid identifier: `{token}`")
            }
        }
    }
}

impl Error for ScanValidationError {}

/// One decoded scan as handed over by the capture layer.
///
/// Ephemeral input: exists only within a single confirmation workflow run
/// and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    /// Opaque text recovered from the scanned symbol.
    pub token: String,
    /// Event timestamp, already normalized to local civil time by the
    /// caller (see `config::LocalClock`).
    pub scanned_at: NaiveDateTime,
}

impl ScanEvent {
    pub fn new(token: impl Into<String>, scanned_at: NaiveDateTime) -> Self {
        Self {
            token: token.into(),
            scanned_at,
        }
    }

    /// Validates and parses the raw token into a person identifier.
    ///
    /// # Contract
    /// - Surrounding whitespace is ignored.
    /// - Anything that is not a canonical UUID is rejected before any
    ///   lookup is attempted.
    pub fn person_token(&self) -> Result<PersonId, ScanValidationError> {
        let trimmed = self.token.trim();
        if trimmed.is_empty() {
            return Err(ScanValidationError::BlankToken);
        }
        Uuid::parse_str(trimmed)
            .map_err(|_| ScanValidationError::MalformedToken(trimmed.to_string()))
    }
}

/// Durable attendance fact for one person and one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Stable record ID used for auditing and history views.
    pub uuid: RecordId,
    /// Person this record belongs to.
    pub person_uuid: PersonId,
    /// Local calendar day scoping the one-record-per-day invariant.
    pub day: NaiveDate,
    /// Classified presence status at scan time.
    pub status: PresenceStatus,
    /// Operator who confirmed the scan.
    pub operator_uuid: OperatorId,
    /// Classified event timestamp, local civil time.
    pub recorded_at: NaiveDateTime,
}

/// Persisted-state consistency failure for attendance records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDayMismatch {
    pub uuid: RecordId,
    pub day: NaiveDate,
    pub recorded_at: NaiveDateTime,
}

impl Display for RecordDayMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attendance record {} day {} disagrees with recorded_at {}",
            self.uuid, self.day, self.recorded_at
        )
    }
}

impl Error for RecordDayMismatch {}

impl AttendanceRecord {
    /// Creates a new record with a generated stable ID.
    ///
    /// # Invariants
    /// - `day` is derived from `scanned_at`, keeping the day/timestamp
    ///   consistency by construction.
    pub fn new(
        person_uuid: PersonId,
        status: PresenceStatus,
        operator_uuid: OperatorId,
        scanned_at: NaiveDateTime,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            person_uuid,
            day: scanned_at.date(),
            status,
            operator_uuid,
            recorded_at: scanned_at,
        }
    }

    /// Checks the day/timestamp consistency invariant.
    ///
    /// Used by read paths to reject invalid persisted state instead of
    /// masking it.
    pub fn validate(&self) -> Result<(), RecordDayMismatch> {
        if self.day != self.recorded_at.date() {
            return Err(RecordDayMismatch {
                uuid: self.uuid,
                day: self.day,
                recorded_at: self.recorded_at,
            });
        }
        Ok(())
    }
}

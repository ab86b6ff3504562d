//! Attendance recorder service.
//!
//! # Responsibility
//! - Persist a classified scan as an immutable record.
//!
//! # Invariants
//! - The only mutating operation is `record`; it composes the store's
//!   atomic create-if-absent and either persists a genuinely new record
//!   or fails without partial effects.

use chrono::{NaiveDate, NaiveDateTime};
use log::info;

use crate::model::person::PersonId;
use crate::model::record::{AttendanceRecord, OperatorId, PresenceStatus};
use crate::repo::record_repo::{AttendanceStore, CreateOutcome, StoreResult};

/// Outcome of one record attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A genuinely new record was persisted.
    Recorded(AttendanceRecord),
    /// A record for this person and day already existed; the losing
    /// classification is discarded.
    DuplicateScan {
        person_uuid: PersonId,
        day: NaiveDate,
    },
}

/// Write-side service over the durable attendance store.
pub struct AttendanceRecorder<S: AttendanceStore> {
    store: S,
}

impl<S: AttendanceStore> AttendanceRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a classified scan for the given person and operator.
    ///
    /// # Contract
    /// - `scanned_at` is local civil time; the calendar day is derived
    ///   from it.
    /// - Exactly one of any number of concurrent attempts for the same
    ///   person and day observes `Recorded`.
    pub fn record(
        &self,
        person_uuid: PersonId,
        status: PresenceStatus,
        operator_uuid: OperatorId,
        scanned_at: NaiveDateTime,
    ) -> StoreResult<RecordOutcome> {
        let record = AttendanceRecord::new(person_uuid, status, operator_uuid, scanned_at);

        match self.store.create_if_absent(&record)? {
            CreateOutcome::Created(record) => {
                info!(
                    "event=attendance_recorded module=recorder status=ok person={} day={} operator={}",
                    record.person_uuid, record.day, record.operator_uuid
                );
                Ok(RecordOutcome::Recorded(record))
            }
            CreateOutcome::AlreadyExists => {
                info!(
                    "event=attendance_recorded module=recorder status=duplicate person={} day={}",
                    record.person_uuid, record.day
                );
                Ok(RecordOutcome::DuplicateScan {
                    person_uuid: record.person_uuid,
                    day: record.day,
                })
            }
        }
    }
}

//! Read-side statistics aggregation.
//!
//! # Responsibility
//! - Derive per-day and rolling trend counts from stored records.
//!
//! # Invariants
//! - Aggregates are computed on read from the raw record query; the
//!   aggregator can never disagree with the store.
//! - Each trend day is computed independently; no incremental state is
//!   carried across days.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::config::AbsenceAccounting;
use crate::model::record::PresenceStatus;
use crate::repo::person_repo::{DirectoryError, PersonDirectory};
use crate::repo::record_repo::{AttendanceStore, StoreError};

pub type StatsResult<T> = Result<T, StatsError>;

/// Aggregation failure from either collaborator.
#[derive(Debug)]
pub enum StatsError {
    Directory(DirectoryError),
    Store(StoreError),
    /// Requested trend window underflows the calendar.
    InvalidRange { end_day: NaiveDate, days: u32 },
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidRange { end_day, days } => {
                write!(f, "trend window of {days} days ending {end_day} is out of range")
            }
        }
    }
}

impl Error for StatsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::InvalidRange { .. } => None,
        }
    }
}

impl From<DirectoryError> for StatsError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl From<StoreError> for StatsError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Per-day counts of records by status, plus total known persons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyAggregate {
    pub day: NaiveDate,
    pub present: u64,
    pub late: u64,
    pub absent: u64,
    pub total_persons: u64,
}

/// Stateless read-side aggregator over the record store and the identity
/// directory.
pub struct StatsService<D: PersonDirectory, S: AttendanceStore> {
    directory: D,
    store: S,
    accounting: AbsenceAccounting,
}

impl<D: PersonDirectory, S: AttendanceStore> StatsService<D, S> {
    pub fn new(directory: D, store: S, accounting: AbsenceAccounting) -> Self {
        Self {
            directory,
            store,
            accounting,
        }
    }

    /// Counts records per status for one calendar day.
    ///
    /// Under `AbsenceAccounting::CountUnscanned`, persons with no record
    /// at all for the day are added to `absent`; under `ExplicitOnly`
    /// (the default) `absent` is only the explicitly recorded status.
    pub fn daily_stats(&self, day: NaiveDate) -> StatsResult<DailyAggregate> {
        let records = self.store.query_by_day(day)?;
        let total_persons = self.directory.count_all()?;

        let mut present = 0u64;
        let mut late = 0u64;
        let mut absent = 0u64;
        for record in &records {
            match record.status {
                PresenceStatus::Present => present += 1,
                PresenceStatus::Late => late += 1,
                PresenceStatus::Absent => absent += 1,
            }
        }

        if self.accounting == AbsenceAccounting::CountUnscanned {
            absent += total_persons.saturating_sub(records.len() as u64);
        }

        Ok(DailyAggregate {
            day,
            present,
            late,
            absent,
            total_persons,
        })
    }

    /// Aggregates `days` consecutive calendar days ending at `end_day`,
    /// oldest first.
    pub fn trend(&self, end_day: NaiveDate, days: u32) -> StatsResult<Vec<DailyAggregate>> {
        if days == 0 {
            return Ok(Vec::new());
        }

        let start_day = end_day
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or(StatsError::InvalidRange { end_day, days })?;

        start_day
            .iter_days()
            .take(days as usize)
            .map(|day| self.daily_stats(day))
            .collect()
    }
}

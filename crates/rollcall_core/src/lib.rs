//! Core domain logic for attendance scanning.
//! This crate is the single source of truth for classification,
//! duplicate-guard and aggregation invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use config::{AbsenceAccounting, AttendanceConfig, ConfigError, LocalClock, PresencePolicy};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::person::{Person, PersonId};
pub use model::record::{
    AttendanceRecord, OperatorId, PresenceStatus, RecordId, ScanEvent, ScanValidationError,
};
pub use policy::classify;
pub use repo::person_repo::{
    DirectoryError, DirectoryResult, PersonDirectory, SqlitePersonDirectory,
};
pub use repo::record_repo::{
    AttendanceStore, CreateOutcome, SqliteAttendanceStore, StoreError, StoreResult,
};
pub use repo::SchemaError;
pub use service::recorder::{AttendanceRecorder, RecordOutcome};
pub use service::stats::{DailyAggregate, StatsError, StatsResult, StatsService};
pub use service::workflow::{
    ScanFailure, ScanInput, ScanInputError, ScanSession, SessionEvent, SessionState,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

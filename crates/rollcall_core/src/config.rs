//! Runtime configuration surface.
//!
//! # Responsibility
//! - Define the classification thresholds, absence accounting rule and
//!   local-time conversion used across the core.
//!
//! # Invariants
//! - `present_before < late_before` for every accepted policy.
//! - Classification itself never reads wall-clock time; `LocalClock` is the
//!   single place converting a UTC instant into local civil time.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_PRESENT_BEFORE: (u32, u32) = (8, 15);
const DEFAULT_LATE_BEFORE: (u32, u32) = (16, 0);

/// Largest UTC offset accepted for a local clock, in minutes (UTC+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Invalid policy or clock configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `present_before` does not come strictly before `late_before`.
    ThresholdOrder {
        present_before: NaiveTime,
        late_before: NaiveTime,
    },
    /// UTC offset outside the plausible civil range.
    OffsetOutOfRange { utc_offset_minutes: i32 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThresholdOrder {
                present_before,
                late_before,
            } => write!(
                f,
                "present cutoff {present_before} must come before late cutoff {late_before}"
            ),
            Self::OffsetOutOfRange { utc_offset_minutes } => write!(
                f,
                "utc offset {utc_offset_minutes} minutes is outside the supported range"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Times-of-day splitting a calendar day into present/late/absent buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePolicy {
    /// Scans strictly before this time classify as present.
    pub present_before: NaiveTime,
    /// Scans before this time (and at/after `present_before`) classify as
    /// late; at/after it, absent.
    pub late_before: NaiveTime,
}

impl PresencePolicy {
    /// Creates a policy after checking threshold ordering.
    pub fn new(present_before: NaiveTime, late_before: NaiveTime) -> Result<Self, ConfigError> {
        if present_before >= late_before {
            return Err(ConfigError::ThresholdOrder {
                present_before,
                late_before,
            });
        }
        Ok(Self {
            present_before,
            late_before,
        })
    }
}

impl Default for PresencePolicy {
    /// Default cutoffs: present before 08:15, late before 16:00.
    fn default() -> Self {
        let (ph, pm) = DEFAULT_PRESENT_BEFORE;
        let (lh, lm) = DEFAULT_LATE_BEFORE;
        Self {
            present_before: NaiveTime::from_hms_opt(ph, pm, 0)
                .unwrap_or(NaiveTime::MIN),
            late_before: NaiveTime::from_hms_opt(lh, lm, 0)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Absence accounting rule applied by the statistics aggregator.
///
/// Exactly one rule applies per configuration; the two are never blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceAccounting {
    /// Absent counts only explicitly recorded late-cutoff scans. This keeps
    /// the aggregator consistent with the classifier's own `absent` status.
    #[default]
    ExplicitOnly,
    /// Absent additionally counts persons with no record for the day.
    CountUnscanned,
}

/// Fixed-offset local clock used at the capture boundary.
///
/// The core requires timestamps already normalized to local civil time;
/// this is the one helper performing that normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalClock {
    utc_offset_minutes: i32,
}

impl LocalClock {
    /// Creates a clock for the given UTC offset in minutes.
    pub fn new(utc_offset_minutes: i32) -> Result<Self, ConfigError> {
        if utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::OffsetOutOfRange { utc_offset_minutes });
        }
        Ok(Self { utc_offset_minutes })
    }

    /// Clock pinned to UTC itself.
    pub fn utc() -> Self {
        Self {
            utc_offset_minutes: 0,
        }
    }

    /// Converts a UTC instant into the local civil timestamp.
    pub fn local_timestamp(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        instant.with_timezone(&offset).naive_local()
    }

    /// Local calendar day containing the given UTC instant.
    ///
    /// This is the midnight-to-midnight window scoping the
    /// one-record-per-day invariant.
    pub fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local_timestamp(instant).date()
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// Full configuration surface consumed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceConfig {
    pub policy: PresencePolicy,
    pub absence_accounting: AbsenceAccounting,
    pub clock: LocalClock,
}

#[cfg(test)]
mod tests {
    use super::{AbsenceAccounting, ConfigError, LocalClock, PresencePolicy};
    use chrono::{NaiveTime, TimeZone, Utc};

    #[test]
    fn default_policy_uses_documented_cutoffs() {
        let policy = PresencePolicy::default();
        assert_eq!(
            policy.present_before,
            NaiveTime::from_hms_opt(8, 15, 0).expect("valid time")
        );
        assert_eq!(
            policy.late_before,
            NaiveTime::from_hms_opt(16, 0, 0).expect("valid time")
        );
    }

    #[test]
    fn policy_rejects_inverted_thresholds() {
        let early = NaiveTime::from_hms_opt(8, 0, 0).expect("valid time");
        let late = NaiveTime::from_hms_opt(16, 0, 0).expect("valid time");
        assert!(PresencePolicy::new(late, early).is_err());
        assert!(matches!(
            PresencePolicy::new(early, early),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn default_absence_accounting_is_explicit_only() {
        assert_eq!(AbsenceAccounting::default(), AbsenceAccounting::ExplicitOnly);
    }

    #[test]
    fn local_clock_shifts_timestamp_and_day() {
        // 23:30 UTC on March 10 is 01:30 on March 11 at UTC+2.
        let clock = LocalClock::new(120).expect("valid offset");
        let instant = Utc
            .with_ymd_and_hms(2025, 3, 10, 23, 30, 0)
            .single()
            .expect("valid instant");

        let local = clock.local_timestamp(instant);
        assert_eq!(local.date().to_string(), "2025-03-11");
        assert_eq!(local.time().to_string(), "01:30:00");
        assert_eq!(clock.local_day(instant), local.date());
    }

    #[test]
    fn local_clock_rejects_implausible_offset() {
        assert!(matches!(
            LocalClock::new(15 * 60),
            Err(ConfigError::OffsetOutOfRange { .. })
        ));
    }
}

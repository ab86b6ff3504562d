//! Presence classification engine.
//!
//! # Responsibility
//! - Map an event time-of-day to a presence status under a policy.
//!
//! # Invariants
//! - Pure and deterministic: no stored state, no wall-clock reads. The
//!   timestamp is supplied by the caller, already normalized to local
//!   civil time.
//! - Intervals are half-open; a time exactly on a cutoff belongs to the
//!   later bucket.

use chrono::NaiveTime;

use crate::config::PresencePolicy;
use crate::model::record::PresenceStatus;

/// Classifies a local time-of-day into a presence status.
///
/// # Contract
/// - `t < present_before` -> `Present`
/// - `present_before <= t < late_before` -> `Late`
/// - `t >= late_before` -> `Absent`
pub fn classify(at: NaiveTime, policy: &PresencePolicy) -> PresenceStatus {
    if at < policy.present_before {
        PresenceStatus::Present
    } else if at < policy.late_before {
        PresenceStatus::Late
    } else {
        PresenceStatus::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::config::PresencePolicy;
    use crate::model::record::PresenceStatus;
    use chrono::NaiveTime;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn before_present_cutoff_is_present() {
        let policy = PresencePolicy::default();
        assert_eq!(classify(time(0, 0), &policy), PresenceStatus::Present);
        assert_eq!(classify(time(8, 0), &policy), PresenceStatus::Present);
        assert_eq!(classify(time(8, 14), &policy), PresenceStatus::Present);
    }

    #[test]
    fn between_cutoffs_is_late() {
        let policy = PresencePolicy::default();
        assert_eq!(classify(time(8, 20), &policy), PresenceStatus::Late);
        assert_eq!(classify(time(12, 0), &policy), PresenceStatus::Late);
        assert_eq!(classify(time(15, 59), &policy), PresenceStatus::Late);
    }

    #[test]
    fn at_or_after_late_cutoff_is_absent() {
        let policy = PresencePolicy::default();
        assert_eq!(classify(time(16, 1), &policy), PresenceStatus::Absent);
        assert_eq!(classify(time(23, 59), &policy), PresenceStatus::Absent);
    }

    #[test]
    fn cutoff_values_belong_to_the_later_bucket() {
        let policy = PresencePolicy::default();
        assert_eq!(classify(time(8, 15), &policy), PresenceStatus::Late);
        assert_eq!(classify(time(16, 0), &policy), PresenceStatus::Absent);
    }

    #[test]
    fn custom_policy_thresholds_are_honored() {
        let policy = PresencePolicy::new(time(9, 0), time(17, 30)).expect("valid policy");
        assert_eq!(classify(time(8, 59), &policy), PresenceStatus::Present);
        assert_eq!(classify(time(9, 0), &policy), PresenceStatus::Late);
        assert_eq!(classify(time(17, 30), &policy), PresenceStatus::Absent);
    }
}

//! Operator confirmation workflow.
//!
//! # Responsibility
//! - Coordinate one operator's scan session: scan, classify, confirm,
//!   record.
//! - Emit presentation-boundary events for every observable outcome.
//!
//! # Invariants
//! - One scan in flight per session: scan callbacks arriving while a
//!   candidate awaits confirmation (or is being recorded) are ignored.
//! - The scan-input lease is held only while the session owns the
//!   physical scanner and is released on every exit path.
//! - No failure is swallowed: every error transition emits a `Failed`
//!   event with a distinguishable reason.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::mem;

use crate::config::PresencePolicy;
use crate::model::person::{Person, PersonId};
use crate::model::record::{
    AttendanceRecord, OperatorId, PresenceStatus, ScanEvent, ScanValidationError,
};
use crate::policy::classify;
use crate::repo::person_repo::{DirectoryError, PersonDirectory};
use crate::repo::record_repo::{AttendanceStore, StoreError};
use crate::service::recorder::{AttendanceRecorder, RecordOutcome};

/// Failure reason surfaced at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFailure {
    /// Token is malformed; rejected before any collaborator call.
    InvalidScan(ScanValidationError),
    /// Token does not resolve to a known person.
    PersonNotFound { token: String },
    /// Identity directory cannot be reached.
    LookupUnavailable { message: String },
    /// A record already exists for this person and day.
    DuplicateScan {
        person_uuid: PersonId,
        day: NaiveDate,
    },
    /// Durable store cannot be reached.
    StoreUnavailable { message: String },
    /// Bounded wait on a collaborator call expired.
    Timeout { operation: &'static str },
    /// Physical scan input could not be acquired.
    ScannerUnavailable { message: String },
}

impl ScanFailure {
    /// Whether the operator may retry the same physical scan after
    /// re-entering scanning.
    ///
    /// Not-found, duplicate and validation failures are terminal for the
    /// attempt and are never retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LookupUnavailable { .. }
                | Self::StoreUnavailable { .. }
                | Self::Timeout { .. }
                | Self::ScannerUnavailable { .. }
        )
    }
}

impl Display for ScanFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidScan(err) => write!(f, "{err}"),
            Self::PersonNotFound { token } => {
                write!(f, "no person matches scanned token `{token}`")
            }
            Self::LookupUnavailable { message } => {
                write!(f, "identity lookup unavailable: {message}")
            }
            Self::DuplicateScan { person_uuid, day } => write!(
                f,
                "attendance already recorded for person {person_uuid} on {day}"
            ),
            Self::StoreUnavailable { message } => {
                write!(f, "attendance store unavailable: {message}")
            }
            Self::Timeout { operation } => write!(f, "{operation} timed out"),
            Self::ScannerUnavailable { message } => {
                write!(f, "scan input unavailable: {message}")
            }
        }
    }
}

impl Error for ScanFailure {}

/// Event emitted toward the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ScanStarted,
    ScanStopped,
    /// A scanned token resolved and classified; awaiting confirmation.
    CandidateReady {
        person: Person,
        status: PresenceStatus,
    },
    Confirmed,
    Cancelled,
    Recorded(AttendanceRecord),
    Failed(ScanFailure),
}

/// Observable session state.
#[derive(Debug)]
pub enum SessionState {
    /// No scan session active; scan input not held.
    Idle,
    /// Scan input held, waiting for a decoded token.
    Scanning,
    /// Candidate resolved and classified; operator must confirm or
    /// cancel. New scan callbacks are ignored.
    PendingConfirmation {
        person: Person,
        status: PresenceStatus,
        scanned_at: NaiveDateTime,
    },
    /// Store call in flight; cancellation is no longer possible.
    Recording,
    /// Record persisted; scan input released.
    Recorded,
    /// Attempt failed; scan input released. The operator may re-enter
    /// scanning via `resume_scanning`.
    Error { failure: ScanFailure },
}

/// Failure to acquire the physical scan input.
#[derive(Debug)]
pub struct ScanInputError {
    pub message: String,
}

impl Display for ScanInputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "scan input error: {}", self.message)
    }
}

impl Error for ScanInputError {}

/// Physical scan-input resource (camera/scanner).
///
/// The lease is a single-owner scoped handle: dropping it releases the
/// underlying device. It is never shared across operator sessions.
pub trait ScanInput {
    type Lease;

    fn acquire(&self) -> Result<Self::Lease, ScanInputError>;
}

/// Per-operator confirmation state machine.
///
/// Commands come from the presentation layer; every command returns the
/// events it emitted. Commands invalid for the current state are ignored
/// with a debug log and produce no events.
pub struct ScanSession<D, S, I>
where
    D: PersonDirectory,
    S: AttendanceStore,
    I: ScanInput,
{
    directory: D,
    recorder: AttendanceRecorder<S>,
    scanner: I,
    policy: PresencePolicy,
    operator_uuid: OperatorId,
    state: SessionState,
    lease: Option<I::Lease>,
}

impl<D, S, I> ScanSession<D, S, I>
where
    D: PersonDirectory,
    S: AttendanceStore,
    I: ScanInput,
{
    /// Creates an idle session for one operator.
    ///
    /// The operator identity is explicit here and is persisted on every
    /// record this session creates.
    pub fn new(
        directory: D,
        recorder: AttendanceRecorder<S>,
        scanner: I,
        policy: PresencePolicy,
        operator_uuid: OperatorId,
    ) -> Self {
        Self {
            directory,
            recorder,
            scanner,
            policy,
            operator_uuid,
            state: SessionState::Idle,
            lease: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn operator(&self) -> OperatorId {
        self.operator_uuid
    }

    /// Whether the session currently owns the physical scan input.
    pub fn holds_scan_input(&self) -> bool {
        self.lease.is_some()
    }

    /// `Idle|Recorded -> Scanning`: acquires the scan input.
    pub fn start_scan(&mut self) -> Vec<SessionEvent> {
        match self.state {
            SessionState::Idle | SessionState::Recorded => {}
            _ => {
                debug!(
                    "event=scan_start module=workflow status=ignored operator={} reason=not_idle",
                    self.operator_uuid
                );
                return Vec::new();
            }
        }

        match self.scanner.acquire() {
            Ok(lease) => {
                self.lease = Some(lease);
                self.state = SessionState::Scanning;
                info!(
                    "event=scan_start module=workflow status=ok operator={}",
                    self.operator_uuid
                );
                vec![SessionEvent::ScanStarted]
            }
            Err(err) => {
                warn!(
                    "event=scan_start module=workflow status=error operator={} error={err}",
                    self.operator_uuid
                );
                vec![SessionEvent::Failed(ScanFailure::ScannerUnavailable {
                    message: err.message,
                })]
            }
        }
    }

    /// `Scanning|Recorded|Error -> Idle`: releases the scan input.
    ///
    /// Ignored while a candidate is pending or a store call is in
    /// flight; the attempt must resolve first.
    pub fn stop_scan(&mut self) -> Vec<SessionEvent> {
        match self.state {
            SessionState::Scanning | SessionState::Recorded | SessionState::Error { .. } => {
                self.lease = None;
                self.state = SessionState::Idle;
                info!(
                    "event=scan_stop module=workflow status=ok operator={}",
                    self.operator_uuid
                );
                vec![SessionEvent::ScanStopped]
            }
            _ => {
                debug!(
                    "event=scan_stop module=workflow status=ignored operator={}",
                    self.operator_uuid
                );
                Vec::new()
            }
        }
    }

    /// `Scanning -> PendingConfirmation`: validates, resolves and
    /// classifies a decoded token.
    ///
    /// Ignored in every other state, which is what suspends scan-input
    /// callbacks while an attempt is in flight.
    pub fn token_scanned(&mut self, event: &ScanEvent) -> Vec<SessionEvent> {
        if !matches!(self.state, SessionState::Scanning) {
            debug!(
                "event=token_scanned module=workflow status=ignored operator={} reason=scan_in_flight",
                self.operator_uuid
            );
            return Vec::new();
        }

        let person_id = match event.person_token() {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "event=token_scanned module=workflow status=rejected operator={} error={err}",
                    self.operator_uuid
                );
                return vec![SessionEvent::Failed(ScanFailure::InvalidScan(err))];
            }
        };

        let person = match self.directory.find_by_token(&person_id.to_string()) {
            Ok(Some(person)) => person,
            Ok(None) => {
                warn!(
                    "event=token_scanned module=workflow status=not_found operator={} token={person_id}",
                    self.operator_uuid
                );
                return vec![SessionEvent::Failed(ScanFailure::PersonNotFound {
                    token: person_id.to_string(),
                })];
            }
            Err(DirectoryError::Timeout) => {
                return self.enter_error(ScanFailure::Timeout {
                    operation: "identity lookup",
                });
            }
            Err(err) => {
                return self.enter_error(ScanFailure::LookupUnavailable {
                    message: err.to_string(),
                });
            }
        };

        let status = classify(event.scanned_at.time(), &self.policy);
        info!(
            "event=scan_candidate module=workflow status=ok operator={} person={} status_value={status:?}",
            self.operator_uuid, person.uuid
        );

        let candidate = SessionEvent::CandidateReady {
            person: person.clone(),
            status,
        };
        self.state = SessionState::PendingConfirmation {
            person,
            status,
            scanned_at: event.scanned_at,
        };
        vec![candidate]
    }

    /// `PendingConfirmation -> Recording -> Recorded|Error`: persists the
    /// pending candidate.
    ///
    /// Once the store call is in flight the session waits for its
    /// outcome; there is no cancellation past this point.
    pub fn confirm(&mut self) -> Vec<SessionEvent> {
        let previous = mem::replace(&mut self.state, SessionState::Recording);
        let (person, status, scanned_at) = match previous {
            SessionState::PendingConfirmation {
                person,
                status,
                scanned_at,
            } => (person, status, scanned_at),
            other => {
                self.state = other;
                debug!(
                    "event=scan_confirm module=workflow status=ignored operator={} reason=no_pending_candidate",
                    self.operator_uuid
                );
                return Vec::new();
            }
        };

        let mut events = vec![SessionEvent::Confirmed];
        match self
            .recorder
            .record(person.uuid, status, self.operator_uuid, scanned_at)
        {
            Ok(RecordOutcome::Recorded(record)) => {
                self.lease = None;
                self.state = SessionState::Recorded;
                info!(
                    "event=scan_confirm module=workflow status=ok operator={} person={} day={}",
                    self.operator_uuid, record.person_uuid, record.day
                );
                events.push(SessionEvent::Recorded(record));
            }
            Ok(RecordOutcome::DuplicateScan { person_uuid, day }) => {
                events.extend(self.enter_error(ScanFailure::DuplicateScan { person_uuid, day }));
            }
            Err(StoreError::Timeout) => {
                events.extend(self.enter_error(ScanFailure::Timeout {
                    operation: "record create",
                }));
            }
            Err(err) => {
                events.extend(self.enter_error(ScanFailure::StoreUnavailable {
                    message: err.to_string(),
                }));
            }
        }

        events
    }

    /// `PendingConfirmation -> Scanning`: operator rejects the candidate.
    ///
    /// No persisted effect; the scan input stays held so the next person
    /// can scan immediately.
    pub fn cancel(&mut self) -> Vec<SessionEvent> {
        if !matches!(self.state, SessionState::PendingConfirmation { .. }) {
            debug!(
                "event=scan_cancel module=workflow status=ignored operator={}",
                self.operator_uuid
            );
            return Vec::new();
        }

        self.state = SessionState::Scanning;
        info!(
            "event=scan_cancel module=workflow status=ok operator={}",
            self.operator_uuid
        );
        vec![SessionEvent::Cancelled]
    }

    /// `Error -> Scanning`: re-enters scanning after a failed attempt,
    /// reacquiring the scan input.
    pub fn resume_scanning(&mut self) -> Vec<SessionEvent> {
        if !matches!(self.state, SessionState::Error { .. }) {
            debug!(
                "event=scan_resume module=workflow status=ignored operator={}",
                self.operator_uuid
            );
            return Vec::new();
        }

        match self.scanner.acquire() {
            Ok(lease) => {
                self.lease = Some(lease);
                self.state = SessionState::Scanning;
                info!(
                    "event=scan_resume module=workflow status=ok operator={}",
                    self.operator_uuid
                );
                vec![SessionEvent::ScanStarted]
            }
            Err(err) => self.enter_error(ScanFailure::ScannerUnavailable {
                message: err.message,
            }),
        }
    }

    /// Transitions into the error state, releasing the scan input.
    fn enter_error(&mut self, failure: ScanFailure) -> Vec<SessionEvent> {
        self.lease = None;
        warn!(
            "event=scan_failed module=workflow status=error operator={} retryable={} reason={failure}",
            self.operator_uuid,
            failure.is_retryable()
        );
        self.state = SessionState::Error {
            failure: failure.clone(),
        };
        vec![SessionEvent::Failed(failure)]
    }
}

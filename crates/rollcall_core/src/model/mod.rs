//! Domain model for attendance tracking.
//!
//! # Responsibility
//! - Define canonical data structures shared by policy, workflow and
//!   persistence layers.
//! - Keep validation of raw scan input inside the model boundary.
//!
//! # Invariants
//! - Every person and attendance record is identified by a stable UUID.
//! - Attendance records are immutable facts; no mutation helpers exist.

pub mod person;
pub mod record;

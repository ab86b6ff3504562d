//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate collaborator calls into the scan-to-record pipeline and
//!   the read-side aggregation APIs.
//! - Keep UI layers decoupled from storage details.

pub mod recorder;
pub mod stats;
pub mod workflow;

//! Person identity model.
//!
//! # Responsibility
//! - Define the read-only identity shape resolved from a scanned token.
//!
//! # Invariants
//! - `uuid` is stable and owned by the external profile system; this core
//!   never creates or mutates person rows outside of test fixtures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a known person.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PersonId = Uuid;

/// Identity resolved from a scanned token.
///
/// Profile creation and editing live outside this core; a `Person` is only
/// ever read here, never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Stable global ID. The scanned token is expected to equal its
    /// canonical string form.
    pub uuid: PersonId,
    /// Human-readable name shown at the confirmation step.
    pub display_name: String,
    /// Optional grouping attribute, e.g. a department or class.
    pub department: Option<String>,
}

impl Person {
    /// Creates a person with a caller-provided stable ID.
    ///
    /// Used by fixtures and import paths where identity already exists
    /// externally.
    pub fn with_id(
        uuid: PersonId,
        display_name: impl Into<String>,
        department: Option<String>,
    ) -> Self {
        Self {
            uuid,
            display_name: display_name.into(),
            department,
        }
    }

    /// Canonical token form of this person's identifier.
    pub fn token(&self) -> String {
        self.uuid.to_string()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::fact::FactSet;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Recorded enrollment status for a `(subject, course)` pair.
///
/// Both variants count as enrolled; an expired subject keeps access to
/// their progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Enrolled,
    Expired,
}

impl EnrollmentStatus {
    /// The legacy store encoding of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "Enrolled",
            EnrollmentStatus::Expired => "Expired",
        }
    }

    /// Decodes a stored status value; anything unrecognized is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Enrolled" => Some(EnrollmentStatus::Enrolled),
            "Expired" => Some(EnrollmentStatus::Expired),
            _ => None,
        }
    }
}

//
// ─── ENROLLMENT ────────────────────────────────────────────────────────────────
//

/// Course-level facts for an enrolled subject, resolved in one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub status: EnrollmentStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Whether a subject is enrolled in a course, and with what course-level
/// state.
///
/// Absence of enrollment is an ordinary value, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentState {
    NotEnrolled,
    Enrolled(Enrollment),
}

impl EnrollmentState {
    /// Derives the enrollment state from a decoded course-level fact set.
    ///
    /// A subject is enrolled iff a status fact reads `Enrolled` or
    /// `Expired`; the rest of the fact set rides along so callers avoid a
    /// second round trip.
    #[must_use]
    pub fn from_fact_set(facts: &FactSet) -> Self {
        match facts.status() {
            Some(status) => EnrollmentState::Enrolled(Enrollment {
                status,
                started_at: facts.started_at(),
                is_complete: facts.is_complete(),
                completed_at: facts.completed_at(),
            }),
            None => EnrollmentState::NotEnrolled,
        }
    }

    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        matches!(self, EnrollmentState::Enrolled(_))
    }

    #[must_use]
    pub fn enrollment(&self) -> Option<&Enrollment> {
        match self {
            EnrollmentState::Enrolled(e) => Some(e),
            EnrollmentState::NotEnrolled => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

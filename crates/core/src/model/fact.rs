use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::enrollment::EnrollmentStatus;

/// Well-known fact keys.
///
/// The store holds free-form keys; these are the ones the progress core
/// reads and writes.
pub mod keys {
    pub const STATUS: &str = "status";
    pub const IS_COMPLETE: &str = "is_complete";
    pub const START_DATE: &str = "start_date";
    pub const COMPLETED_DATE: &str = "completed_date";
}

/// Legacy encoding of a true `is_complete` value.
pub const COMPLETE_VALUE: &str = "yes";

//
// ─── FACT ──────────────────────────────────────────────────────────────────────
//

/// A timestamped key/value record scoped to a `(subject, entity)` pair.
///
/// Values are the store's raw strings; typed reads go through [`FactSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Fact {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            updated_at,
        }
    }
}

//
// ─── FACT SET ──────────────────────────────────────────────────────────────────
//

/// The decoded, latest-wins view of one `(subject, entity)` fact history.
///
/// This is the single place where the store's stringly-typed legacy values
/// ("yes", "Enrolled", "Expired") are translated into typed data. Input is
/// expected most-recent-first, as the store returns it; for each key only
/// the first row seen is kept, so older history never leaks through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactSet {
    status: Option<Fact>,
    is_complete: Option<Fact>,
    start_date: Option<Fact>,
    completed_date: Option<Fact>,
}

impl FactSet {
    /// Decodes a most-recent-first fact sequence.
    ///
    /// Unknown keys are ignored; they belong to collaborators outside this
    /// core.
    #[must_use]
    pub fn from_facts<I>(facts: I) -> Self
    where
        I: IntoIterator<Item = Fact>,
    {
        let mut set = Self::default();
        for fact in facts {
            let slot = match fact.key.as_str() {
                keys::STATUS => &mut set.status,
                keys::IS_COMPLETE => &mut set.is_complete,
                keys::START_DATE => &mut set.start_date,
                keys::COMPLETED_DATE => &mut set.completed_date,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(fact);
            }
        }
        set
    }

    /// True when no recognized fact is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.is_complete.is_none()
            && self.start_date.is_none()
            && self.completed_date.is_none()
    }

    /// The decoded enrollment status, if a recognizable one is recorded.
    ///
    /// An unparseable status value reads as `None`, the same as an absent
    /// row.
    #[must_use]
    pub fn status(&self) -> Option<EnrollmentStatus> {
        self.status
            .as_ref()
            .and_then(|f| EnrollmentStatus::parse(&f.value))
    }

    /// True iff the latest `is_complete` value is the literal `"yes"`.
    ///
    /// Completion is not monotonic: a later write with any other value
    /// reverts this to false.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.is_complete
            .as_ref()
            .is_some_and(|f| f.value == COMPLETE_VALUE)
    }

    /// When the subject started, taken from the `start_date` row's
    /// timestamp.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_date.as_ref().map(|f| f.updated_at)
    }

    /// When the entity was completed: the `is_complete` row's timestamp,
    /// present only while the entity reads as complete.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_complete() {
            return None;
        }
        self.is_complete.as_ref().map(|f| f.updated_at)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

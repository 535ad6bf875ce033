//! Shared error types for the services crate.

use thiserror::Error;

use lms_core::model::LessonId;
use storage::store::StorageError;

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("cannot enroll with a zero course or subject id")]
    MissingId,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService` and the snapshot builder.
///
/// Absence of enrollment and not-yet-complete lessons are ordinary values,
/// never errors; only structural misses and store failures land here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("lesson {lesson} does not belong to any section of the syllabus")]
    SectionNotFound { lesson: LessonId },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

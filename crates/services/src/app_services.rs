use std::sync::Arc;

use storage::sqlite::SqliteInitError;
use storage::store::Storage;

use crate::enrollment_service::EnrollmentService;
use crate::progress_service::ProgressService;
use crate::snapshot::StudentProgressService;

/// Assembles the course-progress services over one storage backend.
///
/// Built once at process start and passed by reference to consumers; there
/// are no lazily initialized globals.
#[derive(Clone)]
pub struct CourseServices {
    enrollment: EnrollmentService,
    progress: ProgressService,
    student_progress: StudentProgressService,
}

impl CourseServices {
    /// Wires services from an already-built `Storage`.
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        let enrollment = EnrollmentService::new(Arc::clone(&storage.facts));
        let progress = ProgressService::new(Arc::clone(&storage.facts));
        let student_progress = StudentProgressService::new(
            enrollment.clone(),
            Arc::clone(&storage.facts),
            Arc::clone(&storage.content),
        );

        Self {
            enrollment,
            progress,
            student_progress,
        }
    }

    /// Builds services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection or migrations fail.
    pub async fn new_sqlite(db_url: &str) -> Result<Self, SqliteInitError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage))
    }

    #[must_use]
    pub fn enrollment(&self) -> &EnrollmentService {
        &self.enrollment
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn student_progress(&self) -> &StudentProgressService {
        &self.student_progress
    }
}

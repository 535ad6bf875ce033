use std::sync::Arc;

use tracing::debug;

use lms_core::model::{CourseId, EnrollmentState, EnrollmentStatus, EntityId, FactSet, SubjectId};
use lms_core::model::fact::keys;
use storage::store::{FactStore, StorageError};

use crate::error::EnrollmentError;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Resolves and records enrollment state from course-level facts.
///
/// Enrollment is derived, not stored as its own entity: a subject is
/// enrolled in a course iff a status fact reads `Enrolled` or `Expired`.
#[derive(Clone)]
pub struct EnrollmentService {
    facts: Arc<dyn FactStore>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(facts: Arc<dyn FactStore>) -> Self {
        Self { facts }
    }

    /// Resolves whether `subject_id` is enrolled in `course_id`.
    ///
    /// Returns the full course-level fact view on a match (status, start
    /// date, completion), so callers avoid a second round trip. A zero
    /// course or subject id short-circuits to `NotEnrolled` without
    /// touching the store; so does a subject with no status fact. Neither
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the fact store itself fails.
    pub async fn check_enrollment(
        &self,
        course_id: CourseId,
        subject_id: SubjectId,
    ) -> Result<EnrollmentState, StorageError> {
        let course = EntityId::from(course_id);
        if course.is_zero() || subject_id.is_zero() {
            return Ok(EnrollmentState::NotEnrolled);
        }

        let rows = self.facts.get_facts(subject_id, course).await?;
        let set = FactSet::from_facts(rows);
        Ok(EnrollmentState::from_fact_set(&set))
    }

    /// Enrolls a subject in a course.
    ///
    /// Writes the status fact and then a start-date marker; the enrollment
    /// record exists from the first status write onward and is only ever
    /// overwritten, never deleted.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::MissingId` for zero ids, or
    /// `EnrollmentError::Storage` if a write fails.
    pub async fn enroll(
        &self,
        course_id: CourseId,
        subject_id: SubjectId,
    ) -> Result<(), EnrollmentError> {
        let course = EntityId::from(course_id);
        if course.is_zero() || subject_id.is_zero() {
            return Err(EnrollmentError::MissingId);
        }

        debug!(%course_id, %subject_id, "enrolling subject");
        self.facts
            .put_fact(
                subject_id,
                course,
                keys::STATUS,
                EnrollmentStatus::Enrolled.as_str(),
            )
            .await?;
        self.facts
            .put_fact(subject_id, course, keys::START_DATE, "")
            .await?;
        Ok(())
    }

    /// Marks a subject's enrollment as expired.
    ///
    /// The status fact is overwritten; progress facts stay untouched, so an
    /// expired subject still resolves as enrolled with their history
    /// intact.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::MissingId` for zero ids, or
    /// `EnrollmentError::Storage` if the write fails.
    pub async fn expire(
        &self,
        course_id: CourseId,
        subject_id: SubjectId,
    ) -> Result<(), EnrollmentError> {
        let course = EntityId::from(course_id);
        if course.is_zero() || subject_id.is_zero() {
            return Err(EnrollmentError::MissingId);
        }

        debug!(%course_id, %subject_id, "expiring enrollment");
        self.facts
            .put_fact(
                subject_id,
                course,
                keys::STATUS,
                EnrollmentStatus::Expired.as_str(),
            )
            .await?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::fixed_clock;
    use storage::store::InMemoryStore;

    fn service(store: &InMemoryStore) -> EnrollmentService {
        EnrollmentService::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn no_facts_means_not_enrolled() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);

        let state = svc
            .check_enrollment(CourseId::new(1), SubjectId::new(7))
            .await
            .unwrap();
        assert_eq!(state, EnrollmentState::NotEnrolled);
    }

    #[tokio::test]
    async fn zero_ids_short_circuit_without_error() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);

        let state = svc
            .check_enrollment(CourseId::new(0), SubjectId::new(7))
            .await
            .unwrap();
        assert_eq!(state, EnrollmentState::NotEnrolled);

        let state = svc
            .check_enrollment(CourseId::new(1), SubjectId::new(0))
            .await
            .unwrap();
        assert_eq!(state, EnrollmentState::NotEnrolled);
    }

    #[tokio::test]
    async fn enroll_then_check_reports_enrolled_with_start_date() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = CourseId::new(1);
        let subject = SubjectId::new(7);

        svc.enroll(course, subject).await.unwrap();

        let state = svc.check_enrollment(course, subject).await.unwrap();
        let enrollment = state.enrollment().expect("should be enrolled");
        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
        assert!(enrollment.started_at.is_some());
        assert!(!enrollment.is_complete);
    }

    #[tokio::test]
    async fn status_alone_is_enrolled_even_without_other_facts() {
        let store = InMemoryStore::with_clock(fixed_clock());
        store
            .put_fact_at(
                SubjectId::new(7),
                EntityId::from(CourseId::new(1)),
                keys::STATUS,
                "Enrolled",
                lms_core::time::fixed_now(),
            )
            .unwrap();

        let state = service(&store)
            .check_enrollment(CourseId::new(1), SubjectId::new(7))
            .await
            .unwrap();
        assert!(state.is_enrolled());
    }

    #[tokio::test]
    async fn expire_keeps_subject_enrolled_with_expired_status() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = CourseId::new(1);
        let subject = SubjectId::new(7);

        svc.enroll(course, subject).await.unwrap();
        svc.expire(course, subject).await.unwrap();

        let state = svc.check_enrollment(course, subject).await.unwrap();
        assert_eq!(
            state.enrollment().unwrap().status,
            EnrollmentStatus::Expired
        );
    }

    #[tokio::test]
    async fn enroll_rejects_zero_ids() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);

        assert!(matches!(
            svc.enroll(CourseId::new(0), SubjectId::new(7)).await,
            Err(EnrollmentError::MissingId)
        ));
        assert!(matches!(
            svc.expire(CourseId::new(1), SubjectId::new(0)).await,
            Err(EnrollmentError::MissingId)
        ));
    }
}

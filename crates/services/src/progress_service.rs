use std::sync::Arc;

use tracing::debug;

use lms_core::model::fact::{COMPLETE_VALUE, keys};
use lms_core::model::{Course, EntityId, FactSet, LessonId, SubjectId, percent_complete};
use storage::store::FactStore;

use crate::error::ProgressError;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Walks a course syllabus and joins it against completion facts.
///
/// Stateless between calls: every operation is a fresh read against the
/// fact store, so concurrent calls need no coordination.
#[derive(Clone)]
pub struct ProgressService {
    facts: Arc<dyn FactStore>,
}

impl ProgressService {
    #[must_use]
    pub fn new(facts: Arc<dyn FactStore>) -> Self {
        Self { facts }
    }

    /// True iff the latest `is_complete` fact for `(subject, lesson)` reads
    /// the literal `"yes"`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the fact store fails.
    pub async fn lesson_complete(
        &self,
        subject_id: SubjectId,
        lesson_id: LessonId,
    ) -> Result<bool, ProgressError> {
        let rows = self
            .facts
            .get_facts(subject_id, EntityId::from(lesson_id))
            .await?;
        Ok(FactSet::from_facts(rows).is_complete())
    }

    /// Whole-course percent complete, rounded half-up to a whole percent.
    ///
    /// Zero when the subject has completed nothing or the syllabus is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if any fact read fails; no partial
    /// percentage is produced.
    pub async fn percent_complete(
        &self,
        course: &Course,
        subject_id: SubjectId,
    ) -> Result<u8, ProgressError> {
        let lessons = course.syllabus().all_lesson_ids();
        let completed = self.completed_count(subject_id, &lessons).await?;
        Ok(percent_complete(completed, lessons.len()))
    }

    /// Percent complete within the section that contains `lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::SectionNotFound` when no section of the
    /// syllabus contains the lesson; the miss is surfaced, never coerced
    /// into a division against an undefined section. Storage failures
    /// propagate as `ProgressError::Storage`.
    pub async fn section_percent_complete(
        &self,
        course: &Course,
        subject_id: SubjectId,
        lesson_id: LessonId,
    ) -> Result<u8, ProgressError> {
        let section = course
            .syllabus()
            .section_containing(lesson_id)
            .ok_or(ProgressError::SectionNotFound { lesson: lesson_id })?;

        let completed = self.completed_count(subject_id, section.lessons()).await?;
        Ok(percent_complete(completed, section.lesson_count()))
    }

    /// The first lesson, in syllabus order, the subject has not completed.
    ///
    /// `None` when every lesson is complete or the syllabus is empty.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a fact read fails.
    pub async fn next_uncompleted_lesson(
        &self,
        course: &Course,
        subject_id: SubjectId,
    ) -> Result<Option<LessonId>, ProgressError> {
        for lesson in course.syllabus().all_lesson_ids() {
            if !self.lesson_complete(subject_id, lesson).await? {
                return Ok(Some(lesson));
            }
        }
        Ok(None)
    }

    /// Records a completion fact for an entity (lesson, section, or
    /// course).
    ///
    /// A single last-write-wins upsert; the store's timestamp becomes the
    /// completion date.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the write fails.
    pub async fn mark_complete(
        &self,
        subject_id: SubjectId,
        entity: impl Into<EntityId>,
    ) -> Result<(), ProgressError> {
        let entity = entity.into();
        debug!(%subject_id, %entity, "marking entity complete");
        self.facts
            .put_fact(subject_id, entity, keys::IS_COMPLETE, COMPLETE_VALUE)
            .await?;
        Ok(())
    }

    async fn completed_count(
        &self,
        subject_id: SubjectId,
        lessons: &[LessonId],
    ) -> Result<usize, ProgressError> {
        let mut completed = 0;
        for lesson in lessons {
            if self.lesson_complete(subject_id, *lesson).await? {
                completed += 1;
            }
        }
        Ok(completed)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{CourseId, Fact, Section, SectionId, Syllabus};
    use lms_core::time::fixed_clock;
    use storage::store::{InMemoryStore, StorageError};

    /// Fact store whose every call fails as unreachable.
    struct FailingStore;

    #[async_trait::async_trait]
    impl FactStore for FailingStore {
        async fn get_facts(
            &self,
            _subject: SubjectId,
            _entity: EntityId,
        ) -> Result<Vec<Fact>, StorageError> {
            Err(StorageError::Unavailable("store offline".into()))
        }

        async fn put_fact(
            &self,
            _subject: SubjectId,
            _entity: EntityId,
            _key: &str,
            _value: &str,
        ) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("store offline".into()))
        }
    }

    fn lesson(id: u64) -> LessonId {
        LessonId::new(id)
    }

    /// Two sections: [101, 102] and [201].
    fn build_course() -> Course {
        let syllabus = Syllabus::new(vec![
            Section::new(SectionId::new(10), vec![lesson(101), lesson(102)]),
            Section::new(SectionId::new(20), vec![lesson(201)]),
        ])
        .unwrap();
        Course::new(CourseId::new(1), "Pottery Basics", syllabus).unwrap()
    }

    fn service(store: &InMemoryStore) -> ProgressService {
        ProgressService::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn no_facts_means_zero_percent() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();

        let percent = svc
            .percent_complete(&course, SubjectId::new(7))
            .await
            .unwrap();
        assert_eq!(percent, 0);
    }

    #[tokio::test]
    async fn percent_rounds_half_up_over_three_lessons() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();
        let subject = SubjectId::new(7);

        svc.mark_complete(subject, lesson(101)).await.unwrap();
        assert_eq!(svc.percent_complete(&course, subject).await.unwrap(), 33);

        svc.mark_complete(subject, lesson(102)).await.unwrap();
        assert_eq!(svc.percent_complete(&course, subject).await.unwrap(), 67);

        svc.mark_complete(subject, lesson(201)).await.unwrap();
        assert_eq!(svc.percent_complete(&course, subject).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn percent_never_decreases_as_completions_accumulate() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();
        let subject = SubjectId::new(7);

        let mut last = 0;
        for id in course.syllabus().all_lesson_ids() {
            svc.mark_complete(subject, id).await.unwrap();
            let percent = svc.percent_complete(&course, subject).await.unwrap();
            assert!(percent >= last);
            last = percent;
        }
        assert_eq!(last, 100);
    }

    #[tokio::test]
    async fn lesson_complete_is_idempotent_between_writes() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let subject = SubjectId::new(7);

        svc.mark_complete(subject, lesson(101)).await.unwrap();
        let first = svc.lesson_complete(subject, lesson(101)).await.unwrap();
        let second = svc.lesson_complete(subject, lesson(101)).await.unwrap();
        assert_eq!(first, second);
        assert!(first);
    }

    #[tokio::test]
    async fn empty_syllabus_is_zero_percent_and_no_next_lesson() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = Course::new(CourseId::new(2), "Empty", Syllabus::empty()).unwrap();
        let subject = SubjectId::new(7);

        assert_eq!(svc.percent_complete(&course, subject).await.unwrap(), 0);
        assert_eq!(
            svc.next_uncompleted_lesson(&course, subject).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn section_percent_only_counts_that_section() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();
        let subject = SubjectId::new(7);

        svc.mark_complete(subject, lesson(101)).await.unwrap();

        // Section 10 has 2 lessons, 1 complete.
        let percent = svc
            .section_percent_complete(&course, subject, lesson(102))
            .await
            .unwrap();
        assert_eq!(percent, 50);

        // Section 20 is untouched.
        let percent = svc
            .section_percent_complete(&course, subject, lesson(201))
            .await
            .unwrap();
        assert_eq!(percent, 0);
    }

    #[tokio::test]
    async fn section_percent_for_unknown_lesson_is_an_error() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();

        let err = svc
            .section_percent_complete(&course, SubjectId::new(7), lesson(999))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressError::SectionNotFound { lesson } if lesson == LessonId::new(999)
        ));
    }

    #[tokio::test]
    async fn next_uncompleted_is_first_in_syllabus_order() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();
        let subject = SubjectId::new(7);

        // Only the middle lesson is complete; the scan still starts at the
        // front.
        svc.mark_complete(subject, lesson(102)).await.unwrap();
        assert_eq!(
            svc.next_uncompleted_lesson(&course, subject).await.unwrap(),
            Some(lesson(101))
        );

        svc.mark_complete(subject, lesson(101)).await.unwrap();
        assert_eq!(
            svc.next_uncompleted_lesson(&course, subject).await.unwrap(),
            Some(lesson(201))
        );

        svc.mark_complete(subject, lesson(201)).await.unwrap();
        assert_eq!(
            svc.next_uncompleted_lesson(&course, subject).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn later_non_yes_write_reverts_completion() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let subject = SubjectId::new(7);
        let entity = EntityId::from(lesson(101));

        svc.mark_complete(subject, lesson(101)).await.unwrap();
        assert!(svc.lesson_complete(subject, lesson(101)).await.unwrap());

        store
            .put_fact(subject, entity, keys::IS_COMPLETE, "no")
            .await
            .unwrap();
        assert!(!svc.lesson_complete(subject, lesson(101)).await.unwrap());
    }

    #[tokio::test]
    async fn store_failure_surfaces_instead_of_a_partial_percent() {
        let svc = ProgressService::new(Arc::new(FailingStore));
        let course = build_course();

        let err = svc
            .percent_complete(&course, SubjectId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Storage(StorageError::Unavailable(_))
        ));

        let err = svc
            .next_uncompleted_lesson(&course, SubjectId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Storage(StorageError::Unavailable(_))
        ));
    }
}

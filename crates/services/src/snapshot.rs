use std::sync::Arc;

use tracing::warn;

use lms_core::model::{
    Course, EntityId, FactSet, LessonProgress, ProgressSnapshot, SectionProgress, SubjectId,
};
use storage::store::{ContentLookup, FactStore};

use crate::enrollment_service::EnrollmentService;
use crate::error::ProgressError;

//
// ─── SNAPSHOT BUILDER ──────────────────────────────────────────────────────────
//

/// Assembles the full progress report for one subject/course pair.
///
/// Pure read/aggregate: enrollment, then per-section and per-lesson facts,
/// composed in syllabus order. Nothing is cached or persisted; every build
/// reads the store fresh.
#[derive(Clone)]
pub struct StudentProgressService {
    enrollment: EnrollmentService,
    facts: Arc<dyn FactStore>,
    content: Arc<dyn ContentLookup>,
}

impl StudentProgressService {
    #[must_use]
    pub fn new(
        enrollment: EnrollmentService,
        facts: Arc<dyn FactStore>,
        content: Arc<dyn ContentLookup>,
    ) -> Self {
        Self {
            enrollment,
            facts,
            content,
        }
    }

    /// Builds a fresh `ProgressSnapshot`.
    ///
    /// Title lookups that fail degrade to an empty string; they decorate
    /// the report and must not abort it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if any fact read fails; a partial
    /// snapshot is never returned.
    pub async fn student_progress(
        &self,
        course: &Course,
        subject_id: SubjectId,
    ) -> Result<ProgressSnapshot, ProgressError> {
        let enrollment = self
            .enrollment
            .check_enrollment(course.id(), subject_id)
            .await?;

        let mut sections = Vec::with_capacity(course.syllabus().sections().len());
        for section in course.syllabus().sections() {
            let section_entity = EntityId::from(section.id());
            let section_facts =
                FactSet::from_facts(self.facts.get_facts(subject_id, section_entity).await?);

            let mut lessons = Vec::with_capacity(section.lesson_count());
            for lesson in section.lessons() {
                let lesson_entity = EntityId::from(*lesson);
                let lesson_facts =
                    FactSet::from_facts(self.facts.get_facts(subject_id, lesson_entity).await?);

                lessons.push(LessonProgress {
                    id: *lesson,
                    title: self.title_or_empty(lesson_entity).await,
                    parent_id: section.id(),
                    is_complete: lesson_facts.is_complete(),
                    completed_at: lesson_facts.completed_at(),
                });
            }

            sections.push(SectionProgress {
                id: section.id(),
                title: self.title_or_empty(section_entity).await,
                is_complete: section_facts.is_complete(),
                completed_at: section_facts.completed_at(),
                lessons,
            });
        }

        Ok(ProgressSnapshot {
            course_id: course.id(),
            subject_id,
            enrollment,
            sections,
        })
    }

    async fn title_or_empty(&self, entity: EntityId) -> String {
        match self.content.title_of(entity).await {
            Ok(title) => title,
            Err(err) => {
                warn!(%entity, %err, "title lookup failed, using empty title");
                String::new()
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::fact::keys;
    use lms_core::model::{
        CourseId, EnrollmentState, Fact, LessonId, Section, SectionId, Syllabus,
    };
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

    /// 2 sections x 2 lessons: [101, 102] and [201, 202].
    fn build_course() -> Course {
        let syllabus = Syllabus::new(vec![
            Section::new(SectionId::new(10), vec![lesson(101), lesson(102)]),
            Section::new(SectionId::new(20), vec![lesson(201), lesson(202)]),
        ])
        .unwrap();
        Course::new(CourseId::new(1), "Pottery Basics", syllabus).unwrap()
    }

    fn service(store: &InMemoryStore) -> StudentProgressService {
        let facts: Arc<dyn FactStore> = Arc::new(store.clone());
        let content: Arc<dyn ContentLookup> = Arc::new(store.clone());
        StudentProgressService::new(
            EnrollmentService::new(Arc::clone(&facts)),
            facts,
            content,
        )
    }

    #[tokio::test]
    async fn snapshot_for_two_by_two_course_with_one_completion() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();
        let subject = SubjectId::new(7);
        let course_entity = EntityId::from(course.id());

        store
            .put_fact(subject, course_entity, keys::STATUS, "Enrolled")
            .await
            .unwrap();
        store
            .put_fact(
                subject,
                EntityId::from(lesson(101)),
                keys::IS_COMPLETE,
                "yes",
            )
            .await
            .unwrap();

        let snapshot = svc.student_progress(&course, subject).await.unwrap();

        assert!(snapshot.is_enrolled());
        assert!(!snapshot.course_is_complete());
        assert_eq!(snapshot.sections.len(), 2);
        assert!(!snapshot.sections[0].is_complete);

        let lessons: Vec<_> = snapshot.lessons().collect();
        assert_eq!(lessons.len(), 4);
        assert!(lessons[0].is_complete);
        assert!(lessons[1..].iter().all(|l| !l.is_complete));
    }

    #[tokio::test]
    async fn snapshot_preserves_syllabus_order_and_parent_ids() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();

        let snapshot = svc
            .student_progress(&course, SubjectId::new(7))
            .await
            .unwrap();

        assert_eq!(snapshot.sections[0].id, SectionId::new(10));
        assert_eq!(snapshot.sections[1].id, SectionId::new(20));
        let ids: Vec<_> = snapshot.lessons().map(|l| l.id).collect();
        assert_eq!(ids, vec![lesson(101), lesson(102), lesson(201), lesson(202)]);
        for section in &snapshot.sections {
            for entry in &section.lessons {
                assert_eq!(entry.parent_id, section.id);
            }
        }
    }

    #[tokio::test]
    async fn snapshot_titles_come_from_content_lookup() {
        let store = InMemoryStore::with_clock(fixed_clock());
        store.set_title(SectionId::new(10), "Throwing").unwrap();
        store.set_title(lesson(101), "Centering clay").unwrap();

        let svc = service(&store);
        let snapshot = svc
            .student_progress(&build_course(), SubjectId::new(7))
            .await
            .unwrap();

        assert_eq!(snapshot.sections[0].title, "Throwing");
        assert_eq!(snapshot.sections[0].lessons[0].title, "Centering clay");
        // Unresolvable titles degrade to empty strings instead of aborting.
        assert_eq!(snapshot.sections[1].title, "");
        assert_eq!(snapshot.sections[0].lessons[1].title, "");
    }

    #[tokio::test]
    async fn snapshot_for_unenrolled_subject_still_reports_structure() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);

        let snapshot = svc
            .student_progress(&build_course(), SubjectId::new(99))
            .await
            .unwrap();

        assert_eq!(snapshot.enrollment, EnrollmentState::NotEnrolled);
        assert!(!snapshot.is_enrolled());
        assert_eq!(snapshot.sections.len(), 2);
    }

    #[tokio::test]
    async fn snapshot_carries_section_completion_and_dates() {
        let store = InMemoryStore::with_clock(fixed_clock());
        let svc = service(&store);
        let course = build_course();
        let subject = SubjectId::new(7);

        store
            .put_fact(
                subject,
                EntityId::from(SectionId::new(10)),
                keys::IS_COMPLETE,
                "yes",
            )
            .await
            .unwrap();

        let snapshot = svc.student_progress(&course, subject).await.unwrap();
        assert!(snapshot.sections[0].is_complete);
        assert!(snapshot.sections[0].completed_at.is_some());
        assert!(!snapshot.sections[1].is_complete);
    }

    #[tokio::test]
    async fn store_failure_aborts_the_snapshot() {
        let facts: Arc<dyn FactStore> = Arc::new(FailingStore);
        let content: Arc<dyn ContentLookup> = Arc::new(InMemoryStore::new());
        let svc = StudentProgressService::new(
            EnrollmentService::new(Arc::clone(&facts)),
            facts,
            content,
        );

        let err = svc
            .student_progress(&build_course(), SubjectId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Storage(StorageError::Unavailable(_))
        ));
    }
}

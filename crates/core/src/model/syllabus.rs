use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{LessonId, SectionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyllabusError {
    #[error("section {0} appears more than once in the syllabus")]
    DuplicateSection(SectionId),

    #[error("lesson {0} belongs to more than one section")]
    DuplicateLesson(LessonId),
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// One section of a course syllabus: an id plus its ordered lesson ids.
///
/// Sections reference their lessons by id; lessons are independent content
/// entities and are not owned here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    lessons: Vec<LessonId>,
}

impl Section {
    #[must_use]
    pub fn new(id: SectionId, lessons: Vec<LessonId>) -> Self {
        Self { id, lessons }
    }

    #[must_use]
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Ordered lesson ids belonging to this section.
    #[must_use]
    pub fn lessons(&self) -> &[LessonId] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn contains(&self, lesson_id: LessonId) -> bool {
        self.lessons.contains(&lesson_id)
    }
}

//
// ─── SYLLABUS ──────────────────────────────────────────────────────────────────
//

/// The ordered Section/Lesson tree belonging to a course.
///
/// Construction enforces the strict-tree invariant: every section id is
/// unique and no lesson id appears under two sections. Section and lesson
/// ordering is preserved exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Syllabus {
    sections: Vec<Section>,
}

impl Syllabus {
    /// Builds a syllabus from ordered sections.
    ///
    /// # Errors
    ///
    /// Returns `SyllabusError::DuplicateSection` if a section id repeats, or
    /// `SyllabusError::DuplicateLesson` if a lesson id appears in more than
    /// one section (or twice within one).
    pub fn new(sections: Vec<Section>) -> Result<Self, SyllabusError> {
        let mut seen_sections = HashSet::new();
        let mut seen_lessons = HashSet::new();

        for section in &sections {
            if !seen_sections.insert(section.id()) {
                return Err(SyllabusError::DuplicateSection(section.id()));
            }
            for lesson in section.lessons() {
                if !seen_lessons.insert(*lesson) {
                    return Err(SyllabusError::DuplicateLesson(*lesson));
                }
            }
        }

        Ok(Self { sections })
    }

    /// An empty syllabus (no sections, no lessons).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ordered sections of the syllabus.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Flattened, order-preserving concatenation of every section's lessons.
    #[must_use]
    pub fn all_lesson_ids(&self) -> Vec<LessonId> {
        self.sections
            .iter()
            .flat_map(|s| s.lessons().iter().copied())
            .collect()
    }

    /// Total number of lessons across all sections.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(Section::lesson_count).sum()
    }

    /// The unique section whose lesson list contains `lesson_id`.
    ///
    /// A miss is an explicit `None`; callers must decide their own fallback
    /// rather than computing against an undefined section.
    #[must_use]
    pub fn section_containing(&self, lesson_id: LessonId) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains(lesson_id))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

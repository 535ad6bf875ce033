use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::enrollment::EnrollmentState;
use crate::model::ids::{CourseId, LessonId, SectionId, SubjectId};

//
// ─── PERCENT ───────────────────────────────────────────────────────────────────
//

/// Whole-number percent of `completed` out of `total`, rounded half-up.
///
/// Returns 0 when nothing is completed or the total is zero. Uses exact
/// integer arithmetic: `(200c + t) / 2t` is `100c/t` rounded half-up.
#[must_use]
pub fn percent_complete(completed: usize, total: usize) -> u8 {
    if completed == 0 || total == 0 {
        return 0;
    }
    let completed = completed as u64;
    let total = total as u64;
    let percent = (200 * completed + total) / (2 * total);
    // completed <= total in every caller, but clamp rather than trust it.
    u8::try_from(percent.min(100)).unwrap_or(100)
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Progress entry for a single lesson within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub id: LessonId,
    pub title: String,
    pub parent_id: SectionId,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Progress entry for a section, with its lessons in syllabus order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProgress {
    pub id: SectionId,
    pub title: String,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub lessons: Vec<LessonProgress>,
}

/// The fully assembled, point-in-time progress report for one
/// subject/course pair.
///
/// Built fresh on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub course_id: CourseId,
    pub subject_id: SubjectId,
    pub enrollment: EnrollmentState,
    pub sections: Vec<SectionProgress>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.enrollment.is_enrolled()
    }

    /// True when the course-level completion fact is set.
    #[must_use]
    pub fn course_is_complete(&self) -> bool {
        self.enrollment
            .enrollment()
            .is_some_and(|e| e.is_complete)
    }

    /// Lessons across all sections, in syllabus order.
    pub fn lessons(&self) -> impl Iterator<Item = &LessonProgress> {
        self.sections.iter().flat_map(|s| s.lessons.iter())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_zero_when_nothing_complete() {
        assert_eq!(percent_complete(0, 10), 0);
        assert_eq!(percent_complete(0, 0), 0);
    }

    #[test]
    fn percent_zero_total_is_zero() {
        assert_eq!(percent_complete(3, 0), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        // The documented cases: 1/3 -> 33, 2/3 -> 67.
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        // Exact half rounds up.
        assert_eq!(percent_complete(1, 8), 13);
        assert_eq!(percent_complete(1, 200), 1);
    }

    #[test]
    fn percent_full_and_bounds() {
        assert_eq!(percent_complete(10, 10), 100);
        for completed in 0..=10 {
            let p = percent_complete(completed, 10);
            assert!(p <= 100);
        }
    }

    #[test]
    fn percent_never_decreases_with_an_added_completion() {
        let total = 7;
        let mut last = 0;
        for completed in 0..=total {
            let p = percent_complete(completed, total);
            assert!(p >= last);
            last = p;
        }
    }
}

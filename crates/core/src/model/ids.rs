use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Course
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(u64);

impl CourseId {
    /// Creates a new `CourseId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a Section
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(u64);

impl SectionId {
    /// Creates a new `SectionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a Lesson
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonId(u64);

impl LessonId {
    /// Creates a new `LessonId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a Subject (the learner whose progress is tracked)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(u64);

impl SubjectId {
    /// Creates a new `SubjectId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// True when the id is the zero sentinel (no subject).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Identifier for any fact-scoped entity (course, section, or lesson).
///
/// The fact store keys rows by `(subject, entity)` without caring which kind
/// of entity the id names, so course, section, and lesson ids all convert
/// into this one id space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// True when the id is the zero sentinel (no entity).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<CourseId> for EntityId {
    fn from(id: CourseId) -> Self {
        Self(id.value())
    }
}

impl From<SectionId> for EntityId {
    fn from(id: SectionId) -> Self {
        Self(id.value())
    }
}

impl From<LessonId> for EntityId {
    fn from(id: LessonId) -> Self {
        Self(id.value())
    }
}

// ─── Debug Implementations ─────────────────────────────────────────────────────

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

impl fmt::Debug for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionId({})", self.0)
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for CourseId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(CourseId::new)
            .map_err(|_| ParseIdError {
                kind: "CourseId".to_string(),
            })
    }
}

impl FromStr for SectionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(SectionId::new)
            .map_err(|_| ParseIdError {
                kind: "SectionId".to_string(),
            })
    }
}

impl FromStr for LessonId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(LessonId::new)
            .map_err(|_| ParseIdError {
                kind: "LessonId".to_string(),
            })
    }
}

impl FromStr for SubjectId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(SubjectId::new)
            .map_err(|_| ParseIdError {
                kind: "SubjectId".to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_id_display() {
        let id = CourseId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_course_id_from_str() {
        let id: CourseId = "123".parse().unwrap();
        assert_eq!(id, CourseId::new(123));
    }

    #[test]
    fn test_course_id_from_str_invalid() {
        let result = "not-a-number".parse::<CourseId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_lesson_id_display() {
        let id = LessonId::new(99);
        assert_eq!(id.to_string(), "99");
    }

    #[test]
    fn test_subject_id_zero_sentinel() {
        assert!(SubjectId::new(0).is_zero());
        assert!(!SubjectId::new(7).is_zero());
    }

    #[test]
    fn test_entity_id_from_course_section_lesson() {
        assert_eq!(EntityId::from(CourseId::new(5)), EntityId::new(5));
        assert_eq!(EntityId::from(SectionId::new(6)), EntityId::new(6));
        assert_eq!(EntityId::from(LessonId::new(7)), EntityId::new(7));
    }

    #[test]
    fn test_id_roundtrip() {
        let original = LessonId::new(42);
        let serialized = original.to_string();
        let deserialized: LessonId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }
}

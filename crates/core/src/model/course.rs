use thiserror::Error;

use crate::model::ids::CourseId;
use crate::model::syllabus::Syllabus;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("a course cannot be its own prerequisite")]
    SelfPrerequisite,
}

//
// ─── DISPLAY OPTIONS ───────────────────────────────────────────────────────────
//

/// Site-level presentation toggles that gate optional course attributes.
///
/// When a toggle is off the matching accessor reports the attribute as
/// absent even if a value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_length: bool,
    pub show_difficulty: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_length: true,
            show_difficulty: true,
        }
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course: scalar attributes plus the syllabus it owns.
///
/// All attributes live in explicit typed fields populated at load time;
/// there is no dynamic key/value access.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    short_description: Option<String>,
    sku: Option<String>,
    price_cents: Option<u32>,
    difficulty: Option<String>,
    prerequisite: Option<CourseId>,
    video_embed: Option<String>,
    audio_embed: Option<String>,
    lesson_length: Option<String>,
    display: DisplayOptions,
    syllabus: Syllabus,
}

impl Course {
    /// Creates a new course with the given syllabus and no optional
    /// attributes set.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        syllabus: Syllabus,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            short_description: None,
            sku: None,
            price_cents: None,
            difficulty: None,
            prerequisite: None,
            video_embed: None,
            audio_embed: None,
            lesson_length: None,
            display: DisplayOptions::default(),
            syllabus,
        })
    }

    #[must_use]
    pub fn with_short_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.short_description = Some(description.trim().to_owned()).filter(|d| !d.is_empty());
        self
    }

    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    #[must_use]
    pub fn with_price_cents(mut self, cents: u32) -> Self {
        self.price_cents = Some(cents);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    /// Sets the prerequisite course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::SelfPrerequisite` if `prerequisite` is this
    /// course's own id.
    pub fn with_prerequisite(mut self, prerequisite: CourseId) -> Result<Self, CourseError> {
        if prerequisite == self.id {
            return Err(CourseError::SelfPrerequisite);
        }
        self.prerequisite = Some(prerequisite);
        Ok(self)
    }

    #[must_use]
    pub fn with_video_embed(mut self, embed: impl Into<String>) -> Self {
        self.video_embed = Some(embed.into());
        self
    }

    #[must_use]
    pub fn with_audio_embed(mut self, embed: impl Into<String>) -> Self {
        self.audio_embed = Some(embed.into());
        self
    }

    #[must_use]
    pub fn with_lesson_length(mut self, length: impl Into<String>) -> Self {
        self.lesson_length = Some(length.into());
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    #[must_use]
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    #[must_use]
    pub fn price_cents(&self) -> Option<u32> {
        self.price_cents
    }

    /// Difficulty tag, or `None` when unset or hidden by display options.
    #[must_use]
    pub fn difficulty(&self) -> Option<&str> {
        if !self.display.show_difficulty {
            return None;
        }
        self.difficulty.as_deref()
    }

    /// Stored difficulty tag, ignoring display options.
    ///
    /// The gate is presentational; persistence must see the value even when
    /// it is hidden.
    #[must_use]
    pub fn difficulty_raw(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    /// Prerequisite course id, if one is required.
    #[must_use]
    pub fn prerequisite(&self) -> Option<CourseId> {
        self.prerequisite
    }

    #[must_use]
    pub fn video_embed(&self) -> Option<&str> {
        self.video_embed.as_deref()
    }

    #[must_use]
    pub fn audio_embed(&self) -> Option<&str> {
        self.audio_embed.as_deref()
    }

    /// Lesson length text, or `None` when unset or hidden by display options.
    #[must_use]
    pub fn lesson_length(&self) -> Option<&str> {
        if !self.display.show_length {
            return None;
        }
        self.lesson_length.as_deref()
    }

    /// Stored lesson length text, ignoring display options.
    #[must_use]
    pub fn lesson_length_raw(&self) -> Option<&str> {
        self.lesson_length.as_deref()
    }

    #[must_use]
    pub fn display(&self) -> DisplayOptions {
        self.display
    }

    /// The ordered Section/Lesson tree this course owns.
    #[must_use]
    pub fn syllabus(&self) -> &Syllabus {
        &self.syllabus
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{LessonId, SectionId};
    use crate::model::syllabus::Section;

    fn small_syllabus() -> Syllabus {
        Syllabus::new(vec![Section::new(
            SectionId::new(10),
            vec![LessonId::new(101), LessonId::new(102)],
        )])
        .unwrap()
    }

    #[test]
    fn course_new_rejects_empty_title() {
        let err = Course::new(CourseId::new(1), "   ", Syllabus::empty()).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);
    }

    #[test]
    fn course_trims_title_and_description() {
        let course = Course::new(CourseId::new(1), "  Woodworking 101  ", Syllabus::empty())
            .unwrap()
            .with_short_description("  joinery basics  ");

        assert_eq!(course.title(), "Woodworking 101");
        assert_eq!(course.short_description(), Some("joinery basics"));
    }

    #[test]
    fn course_filters_empty_description() {
        let course = Course::new(CourseId::new(1), "Pottery", Syllabus::empty())
            .unwrap()
            .with_short_description("   ");
        assert_eq!(course.short_description(), None);
    }

    #[test]
    fn course_rejects_self_prerequisite() {
        let err = Course::new(CourseId::new(1), "Pottery", Syllabus::empty())
            .unwrap()
            .with_prerequisite(CourseId::new(1))
            .unwrap_err();
        assert_eq!(err, CourseError::SelfPrerequisite);
    }

    #[test]
    fn course_display_options_gate_length_and_difficulty() {
        let course = Course::new(CourseId::new(1), "Pottery", Syllabus::empty())
            .unwrap()
            .with_difficulty("Beginner")
            .with_lesson_length("6 weeks")
            .with_display(DisplayOptions {
                show_length: false,
                show_difficulty: false,
            });

        assert_eq!(course.difficulty(), None);
        assert_eq!(course.lesson_length(), None);

        // The stored values survive the gate.
        assert_eq!(course.difficulty_raw(), Some("Beginner"));
        assert_eq!(course.lesson_length_raw(), Some("6 weeks"));

        let shown = course.clone().with_display(DisplayOptions::default());
        assert_eq!(shown.difficulty(), Some("Beginner"));
        assert_eq!(shown.lesson_length(), Some("6 weeks"));
    }

    #[test]
    fn course_happy_path() {
        let course = Course::new(CourseId::new(7), "Pottery", small_syllabus())
            .unwrap()
            .with_sku("POT-7")
            .with_price_cents(4_999)
            .with_prerequisite(CourseId::new(3))
            .unwrap()
            .with_video_embed("https://videos.example/pottery")
            .with_audio_embed("https://audio.example/pottery");

        assert_eq!(course.id(), CourseId::new(7));
        assert_eq!(course.sku(), Some("POT-7"));
        assert_eq!(course.price_cents(), Some(4_999));
        assert_eq!(course.prerequisite(), Some(CourseId::new(3)));
        assert_eq!(course.syllabus().lesson_count(), 2);
        assert_eq!(course.video_embed(), Some("https://videos.example/pottery"));
        assert_eq!(course.audio_embed(), Some("https://audio.example/pottery"));
    }
}

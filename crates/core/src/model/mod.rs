mod course;
mod enrollment;
pub mod fact;
mod ids;
mod progress;
mod syllabus;

pub use course::{Course, CourseError, DisplayOptions};
pub use enrollment::{Enrollment, EnrollmentState, EnrollmentStatus};
pub use fact::{Fact, FactSet};
pub use ids::{CourseId, EntityId, LessonId, ParseIdError, SectionId, SubjectId};
pub use progress::{LessonProgress, ProgressSnapshot, SectionProgress, percent_complete};
pub use syllabus::{Section, Syllabus, SyllabusError};

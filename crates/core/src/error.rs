use thiserror::Error;

use crate::model::{CourseError, SyllabusError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Syllabus(#[from] SyllabusError),
}

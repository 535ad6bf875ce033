use lms_core::model::{CourseId, EntityId, LessonId, SectionId, SubjectId};

use crate::store::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn unavailable(e: sqlx::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn section_id_from_i64(v: i64) -> Result<SectionId, StorageError> {
    Ok(SectionId::new(i64_to_u64("section_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn course_id_to_i64(id: CourseId) -> Result<i64, StorageError> {
    u64_to_i64("course_id", id.value())
}

pub(crate) fn section_id_to_i64(id: SectionId) -> Result<i64, StorageError> {
    u64_to_i64("section_id", id.value())
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> Result<i64, StorageError> {
    u64_to_i64("lesson_id", id.value())
}

pub(crate) fn subject_id_to_i64(id: SubjectId) -> Result<i64, StorageError> {
    u64_to_i64("subject_id", id.value())
}

pub(crate) fn entity_id_to_i64(id: EntityId) -> Result<i64, StorageError> {
    u64_to_i64("entity_id", id.value())
}

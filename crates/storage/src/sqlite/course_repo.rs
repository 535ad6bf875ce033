use lms_core::model::{Course, CourseId, DisplayOptions, Section, Syllabus};
use sqlx::Row;

use super::SqliteStore;
use super::mapping::{
    course_id_from_i64, course_id_to_i64, lesson_id_from_i64, lesson_id_to_i64,
    section_id_from_i64, section_id_to_i64, ser, unavailable,
};
use crate::store::{CourseRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteStore {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let course_raw = course_id_to_i64(course.id())?;
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        sqlx::query(
            r"
            INSERT INTO courses (
                id, title, short_description, sku, price_cents, difficulty,
                prerequisite_id, video_embed, audio_embed, lesson_length,
                show_length, show_difficulty
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                short_description = excluded.short_description,
                sku = excluded.sku,
                price_cents = excluded.price_cents,
                difficulty = excluded.difficulty,
                prerequisite_id = excluded.prerequisite_id,
                video_embed = excluded.video_embed,
                audio_embed = excluded.audio_embed,
                lesson_length = excluded.lesson_length,
                show_length = excluded.show_length,
                show_difficulty = excluded.show_difficulty
            ",
        )
        .bind(course_raw)
        .bind(course.title())
        .bind(course.short_description())
        .bind(course.sku())
        .bind(course.price_cents().map(i64::from))
        // Raw accessors: display gating is presentational and must not make
        // the write lossy.
        .bind(course.difficulty_raw())
        .bind(course.prerequisite().map(course_id_to_i64).transpose()?)
        .bind(course.video_embed())
        .bind(course.audio_embed())
        .bind(course.lesson_length_raw())
        .bind(i64::from(course.display().show_length))
        .bind(i64::from(course.display().show_difficulty))
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        // Replace the whole syllabus; positions are rewritten from scratch.
        sqlx::query("DELETE FROM section_lessons WHERE course_id = ?1")
            .bind(course_raw)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        sqlx::query("DELETE FROM sections WHERE course_id = ?1")
            .bind(course_raw)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        for (section_pos, section) in course.syllabus().sections().iter().enumerate() {
            let section_raw = section_id_to_i64(section.id())?;
            sqlx::query(
                r"
                INSERT INTO sections (id, course_id, position)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(section_raw)
            .bind(course_raw)
            .bind(i64::try_from(section_pos).map_err(ser)?)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

            for (lesson_pos, lesson) in section.lessons().iter().enumerate() {
                sqlx::query(
                    r"
                    INSERT INTO section_lessons (section_id, course_id, lesson_id, position)
                    VALUES (?1, ?2, ?3, ?4)
                    ",
                )
                .bind(section_raw)
                .bind(course_raw)
                .bind(lesson_id_to_i64(*lesson)?)
                .bind(i64::try_from(lesson_pos).map_err(ser)?)
                .execute(&mut *tx)
                .await
                .map_err(unavailable)?;
            }
        }

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError> {
        let course_raw = course_id_to_i64(id)?;

        let row = sqlx::query(
            r"
            SELECT
                id, title, short_description, sku, price_cents, difficulty,
                prerequisite_id, video_embed, audio_embed, lesson_length,
                show_length, show_difficulty
            FROM courses
            WHERE id = ?1
            ",
        )
        .bind(course_raw)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or(StorageError::NotFound)?;

        let section_rows = sqlx::query(
            r"
            SELECT id FROM sections
            WHERE course_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(course_raw)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut sections = Vec::with_capacity(section_rows.len());
        for section_row in section_rows {
            let section_raw: i64 = section_row.try_get("id").map_err(ser)?;
            let lesson_rows = sqlx::query(
                r"
                SELECT lesson_id FROM section_lessons
                WHERE course_id = ?1 AND section_id = ?2
                ORDER BY position ASC
                ",
            )
            .bind(course_raw)
            .bind(section_raw)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

            let mut lessons = Vec::with_capacity(lesson_rows.len());
            for lesson_row in lesson_rows {
                lessons.push(lesson_id_from_i64(
                    lesson_row.try_get("lesson_id").map_err(ser)?,
                )?);
            }
            sections.push(Section::new(section_id_from_i64(section_raw)?, lessons));
        }

        // Re-validate on the way out; a corrupt tree must not reach callers.
        let syllabus = Syllabus::new(sections).map_err(ser)?;

        let mut course = Course::new(
            course_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
            row.try_get::<String, _>("title").map_err(ser)?,
            syllabus,
        )
        .map_err(ser)?
        .with_display(DisplayOptions {
            show_length: row.try_get::<i64, _>("show_length").map_err(ser)? != 0,
            show_difficulty: row.try_get::<i64, _>("show_difficulty").map_err(ser)? != 0,
        });

        if let Some(description) = row
            .try_get::<Option<String>, _>("short_description")
            .map_err(ser)?
        {
            course = course.with_short_description(description);
        }
        if let Some(sku) = row.try_get::<Option<String>, _>("sku").map_err(ser)? {
            course = course.with_sku(sku);
        }
        if let Some(cents) = row.try_get::<Option<i64>, _>("price_cents").map_err(ser)? {
            course = course.with_price_cents(u32::try_from(cents).map_err(ser)?);
        }
        if let Some(difficulty) = row.try_get::<Option<String>, _>("difficulty").map_err(ser)? {
            course = course.with_difficulty(difficulty);
        }
        if let Some(prerequisite) = row
            .try_get::<Option<i64>, _>("prerequisite_id")
            .map_err(ser)?
        {
            course = course
                .with_prerequisite(course_id_from_i64(prerequisite)?)
                .map_err(ser)?;
        }
        if let Some(embed) = row.try_get::<Option<String>, _>("video_embed").map_err(ser)? {
            course = course.with_video_embed(embed);
        }
        if let Some(embed) = row.try_get::<Option<String>, _>("audio_embed").map_err(ser)? {
            course = course.with_audio_embed(embed);
        }
        if let Some(length) = row
            .try_get::<Option<String>, _>("lesson_length")
            .map_err(ser)?
        {
            course = course.with_lesson_length(length);
        }

        Ok(course)
    }
}

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: append-only user fact rows, entity titles, and
/// the course/section/lesson syllabus tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        debug!("applying schema migration v1");
        let mut tx = pool.begin().await?;

        // Fact history. Rows only append; reads resolve the latest value
        // per (user_id, post_id, meta_key) by updated_date.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_postmeta (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    post_id INTEGER NOT NULL,
                    meta_key TEXT NOT NULL,
                    meta_value TEXT NOT NULL,
                    updated_date TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_user_postmeta_pair_updated
                    ON user_postmeta (user_id, post_id, updated_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS courses (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    short_description TEXT,
                    sku TEXT,
                    price_cents INTEGER CHECK (price_cents >= 0),
                    difficulty TEXT,
                    prerequisite_id INTEGER,
                    video_embed TEXT,
                    audio_embed TEXT,
                    lesson_length TEXT,
                    show_length INTEGER NOT NULL DEFAULT 1,
                    show_difficulty INTEGER NOT NULL DEFAULT 1
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS sections (
                    id INTEGER NOT NULL,
                    course_id INTEGER NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    PRIMARY KEY (id, course_id),
                    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS section_lessons (
                    section_id INTEGER NOT NULL,
                    course_id INTEGER NOT NULL,
                    lesson_id INTEGER NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    PRIMARY KEY (course_id, lesson_id),
                    FOREIGN KEY (section_id, course_id)
                        REFERENCES sections(id, course_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_sections_course_position
                    ON sections (course_id, position);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_section_lessons_section_position
                    ON section_lessons (course_id, section_id, position);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}

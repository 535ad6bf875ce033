use lms_core::model::EntityId;
use sqlx::Row;

use super::SqliteStore;
use super::mapping::{entity_id_to_i64, ser, unavailable};
use crate::store::{ContentLookup, StorageError};

#[async_trait::async_trait]
impl ContentLookup for SqliteStore {
    async fn title_of(&self, entity: EntityId) -> Result<String, StorageError> {
        let row = sqlx::query("SELECT title FROM posts WHERE id = ?1")
            .bind(entity_id_to_i64(entity)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or(StorageError::NotFound)?;

        row.try_get::<String, _>("title").map_err(ser)
    }
}

impl SqliteStore {
    /// Registers or replaces the display title of an entity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the write fails.
    pub async fn set_title(&self, entity: EntityId, title: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO posts (id, title)
            VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET title = excluded.title
            ",
        )
        .bind(entity_id_to_i64(entity)?)
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}

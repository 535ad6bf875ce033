use chrono::Utc;
use lms_core::model::{EntityId, Fact, SubjectId};
use sqlx::Row;

use super::SqliteStore;
use super::mapping::{entity_id_to_i64, ser, subject_id_to_i64, unavailable};
use crate::store::{FactStore, StorageError};

#[async_trait::async_trait]
impl FactStore for SqliteStore {
    async fn get_facts(
        &self,
        subject: SubjectId,
        entity: EntityId,
    ) -> Result<Vec<Fact>, StorageError> {
        // The id tiebreak keeps same-timestamp writes deterministic: the
        // later insert wins.
        let rows = sqlx::query(
            r"
            SELECT meta_key, meta_value, updated_date
            FROM user_postmeta
            WHERE user_id = ?1 AND post_id = ?2
            ORDER BY updated_date DESC, id DESC
            ",
        )
        .bind(subject_id_to_i64(subject)?)
        .bind(entity_id_to_i64(entity)?)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut facts = Vec::with_capacity(rows.len());
        for row in rows {
            facts.push(Fact::new(
                row.try_get::<String, _>("meta_key").map_err(ser)?,
                row.try_get::<String, _>("meta_value").map_err(ser)?,
                row.try_get("updated_date").map_err(ser)?,
            ));
        }
        Ok(facts)
    }

    async fn put_fact(
        &self,
        subject: SubjectId,
        entity: EntityId,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        // Append-only: history stays in the table, reads take the latest
        // row per key.
        sqlx::query(
            r"
            INSERT INTO user_postmeta (user_id, post_id, meta_key, meta_value, updated_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(subject_id_to_i64(subject)?)
        .bind(entity_id_to_i64(entity)?)
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}

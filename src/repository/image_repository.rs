use super::{
    StoreError, StoreResult, is_foreign_key_violation, map_insert_error, map_update_error,
};
use crate::{
    models::image::{Image, NewImage},
    services::code_generator::CodeLookup,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;

/// Persistence for [`Image`] rows.
#[derive(Clone)]
pub struct ImageStore {
    db: Arc<SqlitePool>,
}

impl ImageStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn find_by_code(&self, code: &str) -> StoreResult<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, code, original_url, title, description, created_at, updated_at,
                    collection_id
             FROM images WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&*self.db)
        .await?;
        Ok(image)
    }

    /// All images of the collection with `collection_code`, oldest first.
    ///
    /// An unknown collection code yields an empty list.
    pub async fn find_all_by_collection_code(
        &self,
        collection_code: &str,
    ) -> StoreResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            "SELECT i.id, i.code, i.original_url, i.title, i.description, i.created_at,
                    i.updated_at, i.collection_id
             FROM images i
             JOIN collections c ON c.id = i.collection_id
             WHERE c.code = ?
             ORDER BY i.id ASC",
        )
        .bind(collection_code)
        .fetch_all(&*self.db)
        .await?;
        Ok(images)
    }

    /// Insert a new image. The owning collection must exist; if it does not,
    /// [`StoreError::MissingOwner`] is returned.
    pub async fn insert(&self, new: &NewImage) -> StoreResult<Image> {
        let now = Utc::now();
        sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (
                code, original_url, title, description, created_at, updated_at, collection_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, code, original_url, title, description, created_at, updated_at,
                      collection_id
            "#,
        )
        .bind(&new.code)
        .bind(&new.original_url)
        .bind(&new.title)
        .bind(&new.description)
        .bind(now)
        .bind(now)
        .bind(new.collection_id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                StoreError::MissingOwner(new.collection_id)
            } else {
                map_insert_error(err, &new.code)
            }
        })
    }

    pub async fn update(&self, image: &Image) -> StoreResult<Image> {
        sqlx::query_as::<_, Image>(
            r#"
            UPDATE images
            SET original_url = ?, title = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, code, original_url, title, description, created_at, updated_at,
                      collection_id
            "#,
        )
        .bind(&image.original_url)
        .bind(&image.title)
        .bind(&image.description)
        .bind(Utc::now())
        .bind(image.id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_update_error(err, "image", &image.code))
    }

    pub async fn delete(&self, image: &Image) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(image.id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                entity: "image",
                code: image.code.clone(),
            });
        }
        Ok(())
    }

    /// Remove every image owned by `collection_id` on the given connection.
    ///
    /// Meant to run inside the collection delete transaction.
    pub async fn delete_all_by_collection(
        conn: &mut SqliteConnection,
        collection_id: i64,
    ) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM images WHERE collection_id = ?")
            .bind(collection_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CodeLookup for ImageStore {
    type Error = StoreError;

    async fn exists_by_code(&self, code: &str) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM images WHERE code = ?")
            .bind(code)
            .fetch_one(&*self.db)
            .await?;
        Ok(count > 0)
    }
}

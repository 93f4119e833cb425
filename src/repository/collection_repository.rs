use super::{
    StoreError, StoreResult, image_repository::ImageStore, map_insert_error, map_update_error,
};
use crate::{
    models::collection::{Collection, NewCollection},
    services::code_generator::CodeLookup,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Persistence for [`Collection`] rows.
#[derive(Clone)]
pub struct CollectionStore {
    db: Arc<SqlitePool>,
}

impl CollectionStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn find_by_code(&self, code: &str) -> StoreResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT id, code, hidden, life_period, title, description, created_at, updated_at
             FROM collections WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&*self.db)
        .await?;
        Ok(collection)
    }

    /// Insert a new collection. Both timestamps are set to now.
    ///
    /// Returns [`StoreError::DuplicateCode`] if another row already holds the code.
    pub async fn insert(&self, new: &NewCollection) -> StoreResult<Collection> {
        let now = Utc::now();
        sqlx::query_as::<_, Collection>(
            r#"
            INSERT INTO collections (
                code, hidden, life_period, title, description, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, code, hidden, life_period, title, description, created_at, updated_at
            "#,
        )
        .bind(&new.code)
        .bind(new.hidden)
        .bind(new.life_period)
        .bind(&new.title)
        .bind(&new.description)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_insert_error(err, &new.code))
    }

    /// Write back the client-mutable fields and refresh `updated_at`.
    pub async fn update(&self, collection: &Collection) -> StoreResult<Collection> {
        sqlx::query_as::<_, Collection>(
            r#"
            UPDATE collections
            SET hidden = ?, life_period = ?, title = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, code, hidden, life_period, title, description, created_at, updated_at
            "#,
        )
        .bind(collection.hidden)
        .bind(collection.life_period)
        .bind(&collection.title)
        .bind(&collection.description)
        .bind(Utc::now())
        .bind(collection.id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_update_error(err, "collection", &collection.code))
    }

    /// Delete a collection together with all of its images.
    ///
    /// Runs in one transaction: images first, then the collection row.
    /// Returns the number of images removed.
    pub async fn delete(&self, collection: &Collection) -> StoreResult<u64> {
        let mut tx = self.db.begin().await?;

        let images = ImageStore::delete_all_by_collection(&mut tx, collection.id).await?;

        let result = sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(collection.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                entity: "collection",
                code: collection.code.clone(),
            });
        }

        tx.commit().await?;
        Ok(images)
    }
}

#[async_trait]
impl CodeLookup for CollectionStore {
    type Error = StoreError;

    async fn exists_by_code(&self, code: &str) -> StoreResult<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM collections WHERE code = ?")
                .bind(code)
                .fetch_one(&*self.db)
                .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::image::NewImage};

    fn new_collection(code: &str) -> NewCollection {
        NewCollection {
            code: code.into(),
            hidden: false,
            life_period: 10_000,
            title: "collection title".into(),
            description: Some("collection description".into()),
        }
    }

    async fn stores() -> (CollectionStore, ImageStore) {
        let pool = Arc::new(db::memory_pool().await);
        (CollectionStore::new(pool.clone()), ImageStore::new(pool))
    }

    #[tokio::test]
    async fn insert_then_find() {
        let (collections, _) = stores().await;
        let created = collections.insert(&new_collection("FEDCBA")).await.unwrap();

        assert_eq!(created.code, "FEDCBA");
        assert_eq!(created.created_at, created.updated_at);

        let found = collections.find_by_code("FEDCBA").await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(collections.find_by_code("ABCDEF").await.unwrap(), None);
    }

    #[tokio::test]
    async fn exists_by_code_tracks_inserts() {
        let (collections, _) = stores().await;
        assert!(!collections.exists_by_code("FEDCBA").await.unwrap());

        collections.insert(&new_collection("FEDCBA")).await.unwrap();
        assert!(collections.exists_by_code("FEDCBA").await.unwrap());
        assert!(!collections.exists_by_code("fedcba").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let (collections, _) = stores().await;
        collections.insert(&new_collection("FEDCBA")).await.unwrap();

        let err = collections
            .insert(&new_collection("FEDCBA"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCode(code) if code == "FEDCBA"));
    }

    #[tokio::test]
    async fn update_keeps_code_and_created_at() {
        let (collections, _) = stores().await;
        let mut collection = collections.insert(&new_collection("FEDCBA")).await.unwrap();
        let created_at = collection.created_at;

        collection.hidden = true;
        collection.title = "renamed".into();
        collection.description = None;
        let updated = collections.update(&collection).await.unwrap();

        assert_eq!(updated.code, "FEDCBA");
        assert!(updated.hidden);
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, None);
        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at >= created_at);
    }

    #[tokio::test]
    async fn update_of_deleted_row_reports_missing() {
        let (collections, _) = stores().await;
        let collection = collections.insert(&new_collection("FEDCBA")).await.unwrap();
        collections.delete(&collection).await.unwrap();

        let err = collections.update(&collection).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { entity: "collection", .. }));
    }

    #[tokio::test]
    async fn delete_cascades_to_images() {
        let (collections, images) = stores().await;
        let doomed = collections.insert(&new_collection("FEDCBA")).await.unwrap();
        let kept = collections.insert(&new_collection("ABCDEF")).await.unwrap();

        for (code, owner) in [("img001", &doomed), ("img002", &doomed), ("img003", &kept)] {
            images
                .insert(&NewImage {
                    code: code.into(),
                    original_url: "https://i.example.com/a.png".into(),
                    title: "title".into(),
                    description: None,
                    collection_id: owner.id,
                })
                .await
                .unwrap();
        }

        let removed = collections.delete(&doomed).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(collections.find_by_code("FEDCBA").await.unwrap(), None);
        assert!(!images.exists_by_code("img001").await.unwrap());
        assert!(!images.exists_by_code("img002").await.unwrap());
        assert!(images.exists_by_code("img003").await.unwrap());
    }

    #[tokio::test]
    async fn deleting_twice_reports_missing() {
        let (collections, _) = stores().await;
        let collection = collections.insert(&new_collection("FEDCBA")).await.unwrap();
        collections.delete(&collection).await.unwrap();

        let err = collections.delete(&collection).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }
}

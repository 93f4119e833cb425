//! CollectionService: collection CRUD plus adding images to a collection.
//!
//! Both create paths draw a fresh code from the [`CodeGenerator`] and then
//! insert. The generator's lookup is only a pre-check; when the insert still
//! trips the UNIQUE index (two creators raced for the same code) a new code
//! is drawn, up to `CodeSettings::persist_attempts` times.

use crate::{
    models::{
        collection::{Collection, CollectionRequest},
        image::{Image, ImageRequest, NewImage},
    },
    repository::{
        StoreError, StoreResult, collection_repository::CollectionStore,
        image_repository::ImageStore,
    },
    services::{
        code_generator::{CodeGenerator, CodeLookup, CodeSettings},
        error::{ServiceError, ServiceResult},
    },
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sqlx::SqlitePool;
use std::{future::Future, sync::Arc};
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct CollectionService {
    collections: CollectionStore,
    images: ImageStore,
    codes: CodeSettings,
}

impl CollectionService {
    pub fn new(db: Arc<SqlitePool>, codes: CodeSettings) -> Self {
        Self {
            collections: CollectionStore::new(db.clone()),
            images: ImageStore::new(db),
            codes,
        }
    }

    pub async fn get_collection(&self, code: &str) -> ServiceResult<Collection> {
        self.collections
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::CollectionNotFound(code.to_string()))
    }

    /// Images of a collection. An unknown code yields an empty list.
    pub async fn list_images(&self, collection_code: &str) -> ServiceResult<Vec<Image>> {
        Ok(self
            .images
            .find_all_by_collection_code(collection_code)
            .await?)
    }

    pub async fn create_collection(&self, request: CollectionRequest) -> ServiceResult<Collection> {
        let mut rng = StdRng::from_entropy();
        self.create_collection_with_rng(request, &mut rng).await
    }

    pub async fn create_collection_with_rng<R>(
        &self,
        request: CollectionRequest,
        rng: &mut R,
    ) -> ServiceResult<Collection>
    where
        R: Rng + Send + ?Sized,
    {
        request.validate()?;

        let collections = &self.collections;
        let collection = insert_with_fresh_code(self.codes, collections, rng, |code| {
            let new = request.clone().into_new(code);
            async move { collections.insert(&new).await }
        })
        .await?;

        info!(code = %collection.code, "created collection");
        Ok(collection)
    }

    /// Attach a new image to the collection identified by `collection_code`.
    pub async fn add_image(
        &self,
        collection_code: &str,
        request: ImageRequest,
    ) -> ServiceResult<Image> {
        let mut rng = StdRng::from_entropy();
        self.add_image_with_rng(collection_code, request, &mut rng)
            .await
    }

    pub async fn add_image_with_rng<R>(
        &self,
        collection_code: &str,
        request: ImageRequest,
        rng: &mut R,
    ) -> ServiceResult<Image>
    where
        R: Rng + Send + ?Sized,
    {
        request.validate()?;
        let collection = self.get_collection(collection_code).await?;

        let images = &self.images;
        let owner = collection.code.as_str();
        let image = insert_with_fresh_code(self.codes, images, rng, |code| {
            let new = request.clone().into_new(code, collection.id);
            async move { insert_image(images, &new, owner).await }
        })
        .await?;

        info!(code = %image.code, collection = %collection.code, "added image");
        Ok(image)
    }

    pub async fn update_collection(
        &self,
        code: &str,
        request: CollectionRequest,
    ) -> ServiceResult<Collection> {
        request.validate()?;
        let mut collection = self.get_collection(code).await?;
        request.apply_to(&mut collection);
        Ok(self.collections.update(&collection).await?)
    }

    /// Delete a collection and, in the same transaction, all of its images.
    pub async fn delete_collection(&self, code: &str) -> ServiceResult<()> {
        let collection = self.get_collection(code).await?;
        let images = self.collections.delete(&collection).await?;
        info!(code = %collection.code, images, "deleted collection");
        Ok(())
    }
}

/// Insert `new` into `images`. A collection deleted after it was looked up
/// is reported as missing under its code, `owner`.
async fn insert_image(images: &ImageStore, new: &NewImage, owner: &str) -> StoreResult<Image> {
    images.insert(new).await.map_err(|err| match err {
        StoreError::MissingOwner(_) => StoreError::Missing {
            entity: "collection",
            code: owner.to_string(),
        },
        other => other,
    })
}

/// Generate a code checked against `lookup`, then run `insert` with it.
///
/// An insert rejected with [`StoreError::DuplicateCode`] is retried with a new
/// code; after `settings.persist_attempts` such rejections the last conflict
/// is returned as [`ServiceError::CodeConflict`]. Any other error ends the
/// loop immediately.
pub(crate) async fn insert_with_fresh_code<L, R, F, Fut, T>(
    settings: CodeSettings,
    lookup: &L,
    rng: &mut R,
    mut insert: F,
) -> ServiceResult<T>
where
    L: CodeLookup<Error = StoreError> + ?Sized,
    R: Rng + Send + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let generator: CodeGenerator = settings.generator;
    let mut last_conflict = None;

    for attempt in 1..=settings.persist_attempts {
        let code = generator
            .generate_with_rng(settings.length, lookup, rng)
            .await?;

        match insert(code).await {
            Ok(row) => return Ok(row),
            Err(StoreError::DuplicateCode(code)) => {
                warn!(attempt, code = %code, "code taken at insert time, drawing a new one");
                last_conflict = Some(code);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::CodeConflict(last_conflict.unwrap_or_default()))
}

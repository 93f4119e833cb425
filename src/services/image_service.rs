use crate::{
    models::image::{Image, ImageRequest},
    repository::image_repository::ImageStore,
    services::error::{ServiceError, ServiceResult},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// Lookup, update and delete of single images.
///
/// Creation lives on `CollectionService` because an image is always created
/// inside a collection.
#[derive(Clone)]
pub struct ImageService {
    images: ImageStore,
}

impl ImageService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self {
            images: ImageStore::new(db),
        }
    }

    pub async fn get_image(&self, code: &str) -> ServiceResult<Image> {
        self.images
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::ImageNotFound(code.to_string()))
    }

    pub async fn update_image(&self, code: &str, request: ImageRequest) -> ServiceResult<Image> {
        request.validate()?;
        let mut image = self.get_image(code).await?;
        request.apply_to(&mut image);
        Ok(self.images.update(&image).await?)
    }

    pub async fn delete_image(&self, code: &str) -> ServiceResult<()> {
        let image = self.get_image(code).await?;
        self.images.delete(&image).await?;
        info!(code = %image.code, "deleted image");
        Ok(())
    }
}

use crate::services::{
    code_generator::CodeSettings, collection_service::CollectionService,
    image_service::ImageService,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Shared SQLite connection pool, also used by the readiness probe.
    pub db: Arc<SqlitePool>,
    pub collections: CollectionService,
    pub images: ImageService,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, codes: CodeSettings) -> Self {
        Self {
            collections: CollectionService::new(db.clone(), codes),
            images: ImageService::new(db.clone()),
            db,
        }
    }
}

//! JSON body extractor that reports unreadable bodies as [`AppError`]s.

use crate::errors::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use tracing::debug;

/// Like `axum::Json`, but a body that cannot be parsed becomes a 400 with
/// the usual error JSON instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("rejected request body: {}", rejection.body_text());
                Err(AppError::bad_request("Failed to read request body"))
            }
        }
    }
}

//! HTTP handlers for single images.

use crate::{
    errors::AppError,
    handlers::extract::JsonBody,
    models::image::{ImageRequest, ImageResponse},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// GET `/images/{code}`
pub async fn get_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state.images.get_image(&code).await?;
    Ok(Json(image.into()))
}

/// PUT `/images/{code}`
pub async fn update_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<ImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state.images.update_image(&code, request).await?;
    Ok(Json(image.into()))
}

/// DELETE `/images/{code}`
pub async fn delete_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.images.delete_image(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

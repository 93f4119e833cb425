//! HTTP handlers for collections and for adding images to them.
//! Validation and code assignment happen in `CollectionService`; these
//! functions only translate between JSON and the service.

use crate::{
    errors::AppError,
    handlers::extract::JsonBody,
    models::{
        collection::{CollectionRequest, CollectionResponse},
        image::{ImageRequest, ImageResponse},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// GET `/collections/{code}`
pub async fn get_collection(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CollectionResponse>, AppError> {
    let collection = state.collections.get_collection(&code).await?;
    Ok(Json(collection.into()))
}

/// GET `/collections/{code}/images`: empty list for an unknown collection.
pub async fn list_collection_images(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let images = state.collections.list_images(&code).await?;
    Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
}

/// POST `/collections`
pub async fn create_collection(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CollectionRequest>,
) -> Result<Response, AppError> {
    let collection = state.collections.create_collection(request).await?;
    let location = format!("/api/v1/collections/{}", collection.code);
    Ok(created(&location, CollectionResponse::from(collection)))
}

/// POST `/collections/{code}`: add an image to the collection.
pub async fn add_image(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<ImageRequest>,
) -> Result<Response, AppError> {
    let image = state.collections.add_image(&code, request).await?;
    let location = format!("/api/v1/images/{}", image.code);
    Ok(created(&location, ImageResponse::from(image)))
}

/// PUT `/collections/{code}`
pub async fn update_collection(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<CollectionRequest>,
) -> Result<Json<CollectionResponse>, AppError> {
    let collection = state.collections.update_collection(&code, request).await?;
    Ok(Json(collection.into()))
}

/// DELETE `/collections/{code}`: removes the collection and its images.
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.collections.delete_collection(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 201 with a `Location` header pointing at the new resource.
fn created<T: Serialize>(location: &str, body: T) -> Response {
    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

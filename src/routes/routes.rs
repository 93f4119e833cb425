//! Defines routes for the collection and image API.
//!
//! ## Structure
//! - **Collection endpoints** (under `/api/v1`)
//!   - `POST   /collections`: create collection
//!   - `GET    /collections/{code}`: fetch collection
//!   - `PUT    /collections/{code}`: replace mutable fields
//!   - `DELETE /collections/{code}`: delete collection and its images
//!   - `POST   /collections/{code}`: add an image
//!   - `GET    /collections/{code}/images`: list images
//!
//! - **Image endpoints** (under `/api/v1`)
//!   - `GET    /images/{code}`
//!   - `PUT    /images/{code}`
//!   - `DELETE /images/{code}`
//!
//! Health probes are mounted at the root.

use crate::{
    errors::describe_errors,
    handlers::{
        collection_handlers::{
            add_image, create_collection, delete_collection, get_collection,
            list_collection_images, update_collection,
        },
        health_handlers::{healthz, readyz},
        image_handlers::{delete_image, get_image, update_image},
    },
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the router for every endpoint, still waiting for its `AppState`.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/collections", post(create_collection))
        .route(
            "/collections/{code}",
            get(get_collection)
                .post(add_image)
                .put(update_collection)
                .delete(delete_collection),
        )
        .route("/collections/{code}/images", get(list_collection_images))
        .route(
            "/images/{code}",
            get(get_image).put(update_image).delete(delete_image),
        );

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
}

/// The complete application: routes, error descriptions, request tracing and state.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(middleware::from_fn(describe_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, services::code_generator::CodeSettings};
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let pool = Arc::new(db::memory_pool().await);
        app(AppState::new(pool, CodeSettings::default()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn collection_json() -> Value {
        json!({
            "hidden": false,
            "lifePeriod": 10000,
            "title": "collection title",
            "description": "collection description"
        })
    }

    fn image_json() -> Value {
        json!({
            "originalUrl": "https://i.example.com/cat.png",
            "title": "title",
            "description": "description"
        })
    }

    async fn create_collection(app: &Router) -> String {
        let body = Some(collection_json());
        let response = send(app, Method::POST, "/api/v1/collections", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = test_app().await;
        let response = send(&app, Method::GET, "/healthz", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readyz_checks_sqlite() {
        let app = test_app().await;
        let response = send(&app, Method::GET, "/readyz", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["checks"]["sqlite"]["ok"], true);
    }

    #[tokio::test]
    async fn create_collection_returns_created_with_location() {
        let app = test_app().await;
        let response = send(
            &app,
            Method::POST,
            "/api/v1/collections",
            Some(collection_json()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = json_body(response).await;
        let code = body["code"].as_str().unwrap();

        assert_eq!(code.len(), 6);
        assert_eq!(location, format!("/api/v1/collections/{code}"));
        assert_eq!(body["title"], "collection title");
        assert_eq!(body["lifePeriod"], 10000);
        assert_eq!(body["hidden"], false);
        assert!(body["expiresAt"].is_string());
    }

    #[tokio::test]
    async fn get_collection_round_trips() {
        let app = test_app().await;
        let code = create_collection(&app).await;

        let response = send(&app, Method::GET, &format!("/api/v1/collections/{code}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["code"], code.as_str());
    }

    #[tokio::test]
    async fn unknown_collection_is_not_found() {
        let app = test_app().await;
        let response = send(&app, Method::GET, "/api/v1/collections/ABCDEF", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Collection was not found for code = ABCDEF");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["description"], "uri=/api/v1/collections/ABCDEF");
    }

    #[tokio::test]
    async fn invalid_collection_lists_violations() {
        let app = test_app().await;
        let response = send(
            &app,
            Method::POST,
            "/api/v1/collections",
            Some(json!({
                "hidden": false,
                "lifePeriod": -5,
                "title": ""
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Constraint Violation");
        let names: Vec<&str> = body["violations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["propertyName"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"lifePeriod"));
        assert!(names.contains(&"title"));
    }

    #[tokio::test]
    async fn unreadable_body_is_bad_request() {
        let app = test_app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/collections")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to read request body");
        assert_eq!(body["description"], "uri=/api/v1/collections");
    }

    #[tokio::test]
    async fn missing_required_field_is_bad_request() {
        let app = test_app().await;
        let response = send(
            &app,
            Method::POST,
            "/api/v1/collections",
            Some(json!({ "lifePeriod": 1000, "title": "no hidden flag" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_collection_replaces_fields() {
        let app = test_app().await;
        let code = create_collection(&app).await;

        let response = send(
            &app,
            Method::PUT,
            &format!("/api/v1/collections/{code}"),
            Some(json!({
                "hidden": true,
                "lifePeriod": 20000,
                "title": "renamed"
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["code"], code.as_str());
        assert_eq!(body["hidden"], true);
        assert_eq!(body["title"], "renamed");
        assert_eq!(body["description"], Value::Null);
    }

    #[tokio::test]
    async fn image_lifecycle() {
        let app = test_app().await;
        let collection = create_collection(&app).await;

        let response = send(
            &app,
            Method::POST,
            &format!("/api/v1/collections/{collection}"),
            Some(image_json()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string();
        let image = json_body(response).await;
        let code = image["code"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/api/v1/images/{code}"));
        assert_eq!(image["originalUrl"], "https://i.example.com/cat.png");

        let listed = json_body(
            send(
                &app,
                Method::GET,
                &format!("/api/v1/collections/{collection}/images"),
                None,
            )
            .await,
        )
        .await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["code"], code.as_str());

        let response = send(
            &app,
            Method::PUT,
            &format!("/api/v1/images/{code}"),
            Some(json!({
                "originalUrl": "https://i.example.com/dog.png",
                "title": "dog"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["originalUrl"],
            "https://i.example.com/dog.png"
        );

        let response = send(&app, Method::DELETE, &format!("/api/v1/images/{code}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, &format!("/api/v1/images/{code}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_for_unknown_collection_is_not_found() {
        let app = test_app().await;
        let response = send(
            &app,
            Method::POST,
            "/api/v1/collections/ABCDEF",
            Some(image_json()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_with_bad_url_is_rejected() {
        let app = test_app().await;
        let collection = create_collection(&app).await;
        let response = send(
            &app,
            Method::POST,
            &format!("/api/v1/collections/{collection}"),
            Some(json!({ "originalUrl": "nope", "title": "title" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["violations"][0]["propertyName"], "originalUrl");
    }

    #[tokio::test]
    async fn delete_collection_cascades() {
        let app = test_app().await;
        let collection = create_collection(&app).await;
        let image = json_body(
            send(
                &app,
                Method::POST,
                &format!("/api/v1/collections/{collection}"),
                Some(image_json()),
            )
            .await,
        )
        .await;
        let image_code = image["code"].as_str().unwrap();

        let response = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/collections/{collection}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, &format!("/api/v1/images/{image_code}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/collections/{collection}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

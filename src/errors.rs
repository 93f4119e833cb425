use crate::services::error::ServiceError;
use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use validator::ValidationErrors;

/// One rejected request field.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintViolation {
    pub property_name: String,
    pub invalid_value: Option<String>,
    pub violation_message: String,
}

/// An HTTP-facing error: status, message and optional field violations.
///
/// `description` names the failed request (`uri=/api/v1/...`). Handlers
/// leave it empty; [`describe_errors`] fills it in.
#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub violations: Vec<ConstraintViolation>,
    pub description: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    error: &'a str,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "no_violations")]
    violations: &'a [ConstraintViolation],
}

fn no_violations(violations: &&[ConstraintViolation]) -> bool {
    violations.is_empty()
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            violations: Vec::new(),
            description: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    /// 400 carrying one entry per failed field rule.
    pub fn validation(errors: &ValidationErrors) -> Self {
        let mut violations: Vec<ConstraintViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let property_name = camel_case(&field);
                errors.iter().map(move |error| ConstraintViolation {
                    property_name: property_name.clone(),
                    invalid_value: error.params.get("value").map(|value| match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    }),
                    violation_message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();
        violations.sort_by(|a, b| {
            (&a.property_name, &a.violation_message).cmp(&(&b.property_name, &b.violation_message))
        });

        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Constraint Violation".into(),
            violations,
            description: None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            status: self.status.as_u16(),
            error: &self.message,
            timestamp: Utc::now(),
            description: self.description.as_deref(),
            violations: &self.violations,
        });

        let mut response = (self.status, body).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Middleware that re-renders [`AppError`] responses with
/// `description: "uri=<path>"` for the request that produced them.
pub async fn describe_errors(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<AppError>() {
        Some(mut err) if err.description.is_none() => {
            err.description = Some(format!("uri={}", path));
            err.into_response()
        }
        _ => response,
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::CollectionNotFound(_) | ServiceError::ImageNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            ServiceError::Validation(ref errors) => AppError::validation(errors),
            ServiceError::CodeConflict(_) => AppError::conflict(err.to_string()),
            ServiceError::CodeGeneration(_) => {
                tracing::error!("{}", err);
                AppError::internal(err.to_string())
            }
            ServiceError::Store(store) => {
                tracing::error!("store failure: {}", store);
                AppError::internal("Internal server error")
            }
        }
    }
}

/// `original_url` -> `originalUrl`, matching the JSON field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::image::ImageRequest, repository::StoreError};
    use http_body_util::BodyExt;
    use validator::Validate;

    #[test]
    fn converts_field_names() {
        assert_eq!(camel_case("original_url"), "originalUrl");
        assert_eq!(camel_case("life_period"), "lifePeriod");
        assert_eq!(camel_case("title"), "title");
    }

    #[test]
    fn maps_service_errors_to_status() {
        let cases = [
            (
                ServiceError::CollectionNotFound("ABCDEF".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::ImageNotFound("ABCDEF".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::CodeConflict("ABCDEF".into()),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::CodeGeneration("exhausted".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Store(StoreError::Sqlx(sqlx::Error::PoolClosed)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn store_failures_hide_details() {
        let err = AppError::from(ServiceError::Store(StoreError::Sqlx(
            sqlx::Error::PoolClosed,
        )));
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn validation_lists_each_violation() {
        let request = ImageRequest {
            original_url: "nope".into(),
            title: " ".into(),
            description: None,
        };
        let errors = request.validate().unwrap_err();
        let err = AppError::from(ServiceError::Validation(errors));

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Constraint Violation");
        let names: Vec<&str> = err
            .violations
            .iter()
            .map(|v| v.property_name.as_str())
            .collect();
        assert_eq!(names, ["originalUrl", "title"]);
        assert_eq!(err.violations[0].invalid_value.as_deref(), Some("nope"));
        assert_eq!(err.violations[0].violation_message, "must be a valid URL");
        assert_eq!(err.violations[1].invalid_value.as_deref(), Some(" "));
        assert_eq!(err.violations[1].violation_message, "must not be blank");
    }

    #[tokio::test]
    async fn response_body_and_extension() {
        let response = AppError::not_found("gone").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<AppError>().is_some());

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "gone");
        assert!(body.get("description").is_none());
        assert!(body.get("violations").is_none());
    }
}

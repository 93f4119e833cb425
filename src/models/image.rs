//! Represents an image record: a titled pointer to an externally hosted URL.

use crate::models::validation::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, validate_not_blank};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A persisted image row.
///
/// Every image belongs to exactly one collection and is removed together
/// with it.
#[derive(Clone, FromRow, Debug, PartialEq)]
pub struct Image {
    pub id: i64,

    /// Unique short code used in URLs.
    pub code: String,

    /// Where the image actually lives.
    pub original_url: String,

    pub title: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Owning collection.
    pub collection_id: i64,
}

#[derive(Clone, Debug)]
pub struct NewImage {
    pub code: String,
    pub original_url: String,
    pub title: String,
    pub description: Option<String>,
    pub collection_id: i64,
}

/// Request body for creating or replacing an image.
#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[validate(url(message = "must be a valid URL"))]
    pub original_url: String,

    #[validate(
        length(max = MAX_TITLE_LEN, message = "size must be at most 254"),
        custom(function = validate_not_blank)
    )]
    pub title: String,

    #[validate(length(max = MAX_DESCRIPTION_LEN, message = "size must be at most 2048"))]
    pub description: Option<String>,
}

impl ImageRequest {
    pub fn into_new(self, code: String, collection_id: i64) -> NewImage {
        NewImage {
            code,
            original_url: self.original_url,
            title: self.title,
            description: self.description,
            collection_id,
        }
    }

    pub fn apply_to(self, image: &mut Image) {
        image.original_url = self.original_url;
        image.title = self.title;
        image.description = self.description;
    }
}

/// JSON view of an image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub code: String,
    pub original_url: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        Self {
            code: image.code,
            original_url: image.original_url,
            title: image.title,
            description: image.description,
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

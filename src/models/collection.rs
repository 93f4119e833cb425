//! Represents a collection: a titled, time-bounded album of images.

use crate::models::validation::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, validate_not_blank};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Upper bound for `life_period`: 366 days in milliseconds.
pub const MAX_LIFE_PERIOD_MS: i64 = 31_622_400_000;

/// A persisted collection row.
///
/// The `code` is assigned once at creation and never changes; clients may
/// only touch `hidden`, `life_period`, `title` and `description`.
#[derive(Clone, FromRow, Debug, PartialEq)]
pub struct Collection {
    /// Internal row identity.
    pub id: i64,

    /// Unique short code used in URLs.
    pub code: String,

    /// Whether the collection is hidden from listings.
    pub hidden: bool,

    /// How long the collection lives after creation, in milliseconds.
    pub life_period: i64,

    pub title: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Moment the collection expires, `created_at + life_period`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        TimeDelta::try_milliseconds(self.life_period)
            .and_then(|period| self.created_at.checked_add_signed(period))
    }
}

/// A collection that has been assigned a code but not yet persisted.
#[derive(Clone, Debug)]
pub struct NewCollection {
    pub code: String,
    pub hidden: bool,
    pub life_period: i64,
    pub title: String,
    pub description: Option<String>,
}

/// Request body for creating or replacing a collection.
#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub hidden: bool,

    #[validate(range(
        min = 1,
        max = MAX_LIFE_PERIOD_MS,
        message = "must be positive and at most 366 days"
    ))]
    pub life_period: i64,

    #[validate(
        length(max = MAX_TITLE_LEN, message = "size must be at most 254"),
        custom(function = validate_not_blank)
    )]
    pub title: String,

    #[validate(length(max = MAX_DESCRIPTION_LEN, message = "size must be at most 2048"))]
    pub description: Option<String>,
}

impl CollectionRequest {
    pub fn into_new(self, code: String) -> NewCollection {
        NewCollection {
            code,
            hidden: self.hidden,
            life_period: self.life_period,
            title: self.title,
            description: self.description,
        }
    }

    /// Copy the client-mutable fields onto an existing collection.
    pub fn apply_to(self, collection: &mut Collection) {
        collection.hidden = self.hidden;
        collection.life_period = self.life_period;
        collection.title = self.title;
        collection.description = self.description;
    }
}

/// JSON view of a collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    pub code: String,
    pub hidden: bool,
    pub life_period: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Collection> for CollectionResponse {
    fn from(collection: Collection) -> Self {
        let expires_at = collection.expires_at();
        Self {
            code: collection.code,
            hidden: collection.hidden,
            life_period: collection.life_period,
            title: collection.title,
            description: collection.description,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
            expires_at,
        }
    }
}

//! Core data models for the image-link service.
//!
//! Entities map to database tables via `sqlx::FromRow`; request and response
//! types carry the JSON wire format and its validation rules.

pub mod collection;
pub mod image;
pub mod validation;

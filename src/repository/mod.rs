//! SQLite-backed stores for collections and images.
//!
//! Both stores implement [`CodeLookup`](crate::services::code_generator::CodeLookup)
//! so the code generator can pre-check candidates against them.

pub mod collection_repository;
pub mod image_repository;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The UNIQUE index on `code` rejected the write.
    #[error("code `{0}` is already taken")]
    DuplicateCode(String),
    /// The row disappeared between read and write.
    #[error("{entity} `{code}` no longer exists")]
    Missing { entity: &'static str, code: String },
    /// The FOREIGN KEY on `images.collection_id` rejected the write.
    #[error("collection #{0} no longer exists")]
    MissingOwner(i64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Return true if the SQLx error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Return true if the SQLx error is a foreign key violation.
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

/// Map an insert error, turning unique violations into [`StoreError::DuplicateCode`].
fn map_insert_error(err: sqlx::Error, code: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicateCode(code.to_string())
    } else {
        StoreError::Sqlx(err)
    }
}

/// Map an update error, turning a vanished row into [`StoreError::Missing`].
fn map_update_error(err: sqlx::Error, entity: &'static str, code: &str) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::Missing {
            entity,
            code: code.to_string(),
        },
        other => StoreError::Sqlx(other),
    }
}

use crate::{repository::StoreError, services::code_generator::CodeGenerationError};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Collection was not found for code = {0}")]
    CollectionNotFound(String),
    #[error("Image was not found for code = {0}")]
    ImageNotFound(String),
    #[error("Constraint Violation")]
    Validation(#[from] ValidationErrors),
    /// The insert kept colliding on the UNIQUE index.
    #[error("code `{0}` is already in use")]
    CodeConflict(String),
    #[error("Failed to generate code: {0}")]
    CodeGeneration(String),
    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCode(code) => ServiceError::CodeConflict(code),
            StoreError::Missing {
                entity: "collection",
                code,
            } => ServiceError::CollectionNotFound(code),
            StoreError::Missing {
                entity: "image",
                code,
            } => ServiceError::ImageNotFound(code),
            other => ServiceError::Store(other),
        }
    }
}

impl From<CodeGenerationError<StoreError>> for ServiceError {
    fn from(err: CodeGenerationError<StoreError>) -> Self {
        match err {
            CodeGenerationError::Lookup(store) => store.into(),
            other => ServiceError::CodeGeneration(other.to_string()),
        }
    }
}

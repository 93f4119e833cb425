pub mod code_generator;
pub mod collection_service;
pub mod error;
pub mod image_service;

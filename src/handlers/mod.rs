pub mod collection_handlers;
pub mod extract;
pub mod health_handlers;
pub mod image_handlers;

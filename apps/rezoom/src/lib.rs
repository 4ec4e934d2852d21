pub mod config;
pub mod errors;
pub mod export;
pub mod model;
pub mod render;
pub mod sync;
pub mod templates;

pub use errors::AppError;

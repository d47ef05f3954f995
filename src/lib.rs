pub mod backend;
pub mod config;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod models;
pub mod parser;
pub mod patch;
pub mod resource;
pub mod startup;
pub mod utils;

// Re-export commonly used types for easier access
pub use backend::{BackendFactory, DirectoryClient, InMemoryDirectory, ResourceKind};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use startup::build_router;

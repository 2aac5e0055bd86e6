pub mod models;
pub mod services;
pub mod validation;

// Re-export all models and services for external use
pub use models::*;
pub use services::*;

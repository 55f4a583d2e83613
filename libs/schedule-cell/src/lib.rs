pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

// Re-export models and services for the booking engine
pub use models::*;
pub use services::*;

// src/lib.rs
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod finnhub;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod quotes;
pub mod routes;
pub mod trading;
pub mod views;

// Re-export commonly used items
pub use db::DatabasePool;
pub use error::AppError;
pub use handlers::AppState;
pub use models::*;
pub use quotes::{QuoteError, QuoteSource};
pub use routes::build_router;

//! Cosmos DB throughput scaling service
//!
//! A single-endpoint HTTP service that reads a collection's provisioned
//! throughput offer, adds a configured RU increment, and writes it back
//! through the Cosmos DB control-plane REST API.

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod services;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;

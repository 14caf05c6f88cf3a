//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, scale};
use crate::middleware::logging::log_request;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/liveness", get(health::liveness));

    // The scaling trigger accepts GET or POST, anonymous, no body semantics
    let scale_routes = Router::new().route("/scale", get(scale::scale).post(scale::scale));

    Router::new()
        .nest("/api", scale_routes)
        .merge(health_routes)
        .layer(create_cors_layer())
        // Custom request logging with trace IDs
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(["x-trace-id".parse().unwrap()])
}

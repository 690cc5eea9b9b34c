//! Gsmaster Library
//!
//! This library contains all the core components of the gsmaster directory
//! server: game servers announce themselves with periodic heartbeats and
//! clients poll the listing to discover them.

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod store;
pub mod validate;

use axum::{
    routing::{get, post},
    Router,
};
use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::AppState;

/// Create the application router with the given state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Directory: heartbeat, removal and listing share one endpoint.
        // Game servers POST their heartbeat; browsers and launchers GET
        // the listing with ?format=table|delimited.
        .route("/", get(api::directory::handle_get))
        .route("/", post(api::directory::handle_post))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Create CORS layer with secure configuration
fn cors_layer() -> CorsLayer {
    // Allow origins from environment or default to localhost for development
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

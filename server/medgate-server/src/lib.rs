//! MedGate Server - identity and session HTTP API
//!
//! Routes under `/api/auth` register, log in and log out users and report
//! the current session. Sessions travel in an HTTP-only `token` cookie.

pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use crate::config::{CliOverrides, ServerSettings};
pub use error::*;
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024;

/// Create the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    routes::create_routes(state.clone())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer(state.frontend_origin.clone()))
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(state)
}

//! JSON endpoint route configuration.

use crate::api::handlers::health_handler;
use crate::state::AppState;
use axum::{Router, routing::get};

/// Operational endpoints, not rate limited.
///
/// # Endpoints
///
/// - `GET /__health__` - Service health and pinned host count
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/__health__", get(health_handler))
}

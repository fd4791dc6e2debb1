//! Top-level router configuration combining API and web routes.
//!
//! # Route Structure
//!
//! - `GET  /`                 - Home page (public)
//! - `GET  /__go__`           - Typed URL to proxy path redirect (public)
//! - `GET  /__health__`       - Health check (public)
//! - `GET  /__static__/*`     - Static assets
//! - `GET  /{host}[/{path}]`  - Proxied Gemini content (rate limited)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on proxy routes

use crate::api;
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use crate::web;
use axum::Router;
use tower_http::services::ServeDir;

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
/// - `static_dir` - directory served under `/__static__`
pub fn app_router(state: AppState, behind_proxy: bool, static_dir: &str) -> Router {
    let proxy_router = if behind_proxy {
        web::routes::proxy_routes().layer(rate_limit::forwarded_layer())
    } else {
        web::routes::proxy_routes().layer(rate_limit::layer())
    };

    Router::new()
        .merge(web::routes::public_routes())
        .merge(api::routes::public_routes())
        .merge(proxy_router)
        .nest_service("/__static__", ServeDir::new(static_dir))
        .with_state(state)
        .layer(tracing::layer())
}

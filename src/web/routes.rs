//! Proxy front end route configuration.

use crate::state::AppState;
use crate::web::handlers::{gemini_handler, go_handler, index_handler, noslash_handler};
use axum::{Router, routing::get};

/// Pages that never contact a capsule.
///
/// # Endpoints
///
/// - `GET /` - Home page with a URL form
/// - `GET /__go__` - Redirect from a typed Gemini URL to its proxy path
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/__go__", get(go_handler))
}

/// Routes that fetch Gemini resources.
///
/// # Endpoints
///
/// - `GET /{host}` - Redirect to `/{host}/`
/// - `GET /{host}/` - Root document of a capsule
/// - `GET /{host}/{*path}` - Any other document
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/{host}", get(noslash_handler))
        .route("/{host}/", get(gemini_handler))
        .route("/{host}/{*path}", get(gemini_handler))
}

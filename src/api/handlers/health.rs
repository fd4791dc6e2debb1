//! Handler for health check endpoint.

use axum::{Json, extract::State};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /__health__`
///
/// # Components Checked
///
/// 1. **Gemini client**: Reports the number of pinned certificates
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "gemini_client": {
///       "status": "ok",
///       "message": "3 pinned hosts"
///     }
///   }
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let pinned = state.proxy_service.pinned_hosts();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            gemini_client: CheckStatus {
                status: "ok".to_string(),
                message: Some(format!("{pinned} pinned hosts")),
            },
        },
    })
}

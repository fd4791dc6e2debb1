//! Handler turning a typed Gemini URL into a proxy path.

use axum::{
    extract::Query,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use serde_json::json;

use crate::domain::gemini::{DEFAULT_PORT, GeminiRequest};
use crate::domain::link_policy::{GEMINI_SCHEME_PREFIX, rewrite_link};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct GoParams {
    pub url: String,
}

/// Redirects to the proxy path of a Gemini URL.
///
/// # Endpoint
///
/// `GET /__go__?url=gemini://example.org/`
///
/// The scheme may be omitted (`example.org/page` is read as
/// `gemini://example.org/page`).
///
/// # Response
///
/// `303 See Other` to `/{host}{path}`.
///
/// # Errors
///
/// Returns 400 Bad Request for non-Gemini URLs and URLs with a non-default port.
pub async fn go_handler(Query(params): Query<GoParams>) -> Result<impl IntoResponse, AppError> {
    let location = proxy_location(&params.url)?;
    Ok(Redirect::to(&location))
}

/// Computes the proxy path for user input.
pub fn proxy_location(input: &str) -> Result<String, AppError> {
    let input = input.trim();
    let absolute = if input.contains("://") {
        input.to_string()
    } else {
        format!("{GEMINI_SCHEME_PREFIX}{input}")
    };

    let request = GeminiRequest::parse(&absolute)
        .map_err(|e| AppError::bad_request("Not a Gemini URL", json!({ "reason": e.to_string() })))?;

    if request.port() != DEFAULT_PORT {
        return Err(AppError::bad_request(
            "Only the default Gemini port is supported",
            json!({ "port": request.port() }),
        ));
    }

    rewrite_link(request.url().as_str(), input, "/").ok_or_else(|| {
        AppError::bad_request("Not a Gemini URL", json!({ "url": input }))
    })
}

//! Gemini proxy page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::application::services::{ProxyOutcome, ProxyTarget};
use crate::domain::link_policy::path_prefix;
use crate::error::AppError;
use crate::state::AppState;

/// Rendered gemtext document.
#[derive(Template, WebTemplate)]
#[template(path = "gemtext.html")]
pub struct GemtextTemplate {
    pub page_title: String,
    pub url: String,
    pub html: String,
    pub source: String,
}

/// Page shown for 3x responses.
#[derive(Template, WebTemplate)]
#[template(path = "redirect.html")]
pub struct RedirectTemplate {
    pub host: String,
    pub url: String,
    pub status: u8,
    pub target: String,
    pub proxied: Option<String>,
}

/// Query form shown for 1x responses.
#[derive(Template, WebTemplate)]
#[template(path = "input.html")]
pub struct InputTemplate {
    pub host: String,
    pub url: String,
    pub status: u8,
    pub prompt: String,
    pub sensitive: bool,
    pub action: String,
}

/// Page shown for 4x, 5x and 6x responses.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub host: String,
    pub url: String,
    pub status: u8,
    pub heading: &'static str,
    pub message: String,
}

/// Redirects a bare host to its root document.
///
/// # Endpoint
///
/// `GET /{host}`
///
/// Responds with `302 Found` to `/{host}/`, keeping the query string.
///
/// # Errors
///
/// Returns 404 Not Found if the segment is not a valid host name.
pub async fn noslash_handler(uri: Uri, RawQuery(query): RawQuery) -> Result<Response, AppError> {
    let target = ProxyTarget::new(host_segment(uri.path()), "/", None)?;

    let mut location = target.proxy_path();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(&query);
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Proxies a Gemini resource.
///
/// # Endpoint
///
/// `GET /{host}/` and `GET /{host}/{*path}`
///
/// The `q` query parameter becomes the Gemini query. Any other non-empty
/// query string is passed through unchanged.
///
/// # Response
///
/// - Gemtext documents are rendered as HTML
/// - Other successful responses are passed through with their MIME type
/// - Redirects, input requests and failures get a dedicated page
///
/// # Errors
///
/// Returns 404 Not Found for invalid hosts, 400 Bad Request for requests
/// that cannot be sent, and 502 Bad Gateway when the capsule cannot be reached
/// or answers with an invalid response.
pub async fn gemini_handler(
    State(state): State<AppState>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let raw_path = uri.path();
    let prefix = path_prefix(raw_path);
    let target = ProxyTarget::new(
        host_segment(raw_path),
        &raw_path[prefix.len()..],
        gemini_query(query.as_deref()),
    )?;

    let outcome = state.proxy_service.fetch(&target).await?;

    Ok(render_outcome(&target, outcome))
}

fn render_outcome(target: &ProxyTarget, outcome: ProxyOutcome) -> Response {
    let host = target.host.clone();
    let url = format!("gemini://{}{}", target.host, target.path);

    match outcome {
        ProxyOutcome::Gemtext(page) => GemtextTemplate {
            page_title: page.title.unwrap_or_else(|| page.url.clone()),
            url: page.url,
            html: page.html,
            source: page.source,
        }
        .into_response(),
        ProxyOutcome::Raw { content_type, body } => raw_response(&content_type, body),
        ProxyOutcome::Redirect {
            status,
            target: redirect_target,
            proxied,
        } => RedirectTemplate {
            host,
            url,
            status,
            target: redirect_target,
            proxied,
        }
        .into_response(),
        ProxyOutcome::Input {
            status,
            prompt,
            sensitive,
        } => InputTemplate {
            host,
            url,
            status,
            prompt,
            sensitive,
            action: target.proxy_path(),
        }
        .into_response(),
        ProxyOutcome::Failure { status, message } => (
            failure_status(status),
            ErrorTemplate {
                host,
                url,
                status,
                heading: failure_heading(status),
                message,
            },
        )
            .into_response(),
    }
}

fn raw_response(content_type: &str, body: Vec<u8>) -> Response {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}

/// First path segment without its slash.
fn host_segment(path: &str) -> &str {
    path_prefix(path).trim_start_matches('/')
}

/// Extracts the Gemini query from the proxy query string.
pub fn gemini_query(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|r| !r.is_empty())?;

    form_urlencoded::parse(raw.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .or_else(|| Some(raw.to_string()))
}

/// HTTP status used when presenting a Gemini failure.
pub fn failure_status(status: u8) -> StatusCode {
    match status {
        51 => StatusCode::NOT_FOUND,
        52 => StatusCode::GONE,
        50..=59 => StatusCode::BAD_GATEWAY,
        40..=49 => StatusCode::SERVICE_UNAVAILABLE,
        60..=69 => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn failure_heading(status: u8) -> &'static str {
    match status {
        40..=49 => "Temporary failure",
        50..=59 => "Permanent failure",
        60..=69 => "Client certificate required",
        _ => "Failure",
    }
}

//! Gemini proxy service.

use crate::domain::client::GeminiClient;
use crate::domain::gemini::{GeminiRequest, GeminiResponse, StatusCategory, decode_text};
use crate::domain::gemtext;
use crate::domain::link_policy::rewrite_link;
use crate::error::AppError;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use url::Url;

static HOST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+(?:\.[a-z0-9-]+)*$").expect("valid host regex"));

/// Prompt shown for input requests with an empty meta.
pub const DEFAULT_INPUT_PROMPT: &str = "Enter your query";

/// The Gemini resource addressed by a proxy URL (`/{host}{path}?q=...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub host: String,
    /// Path as received, still percent-encoded, always starting with `/`.
    pub path: String,
    pub query: Option<String>,
}

impl ProxyTarget {
    /// Creates a target, validating the host segment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when `host` is not a lower-case DNS name.
    pub fn new(
        host: impl Into<String>,
        path: impl Into<String>,
        query: Option<String>,
    ) -> Result<Self, AppError> {
        let host = host.into();
        if !HOST_REGEX.is_match(&host) {
            return Err(AppError::not_found(
                "Not a Gemini host",
                json!({ "host": host }),
            ));
        }

        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Ok(Self { host, path, query })
    }

    /// Path of this target on the proxy.
    pub fn proxy_path(&self) -> String {
        format!("/{}{}", self.host, self.path)
    }
}

/// What the proxy should present for a Gemini response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOutcome {
    /// A gemtext document rendered as HTML.
    Gemtext(GemtextPage),
    /// Any other successful response, passed through unchanged.
    Raw {
        content_type: String,
        body: Vec<u8>,
    },
    Redirect {
        status: u8,
        target: String,
        /// Proxy path for the target when it is a Gemini URL.
        proxied: Option<String>,
    },
    Input {
        status: u8,
        prompt: String,
        sensitive: bool,
    },
    Failure {
        status: u8,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemtextPage {
    pub url: String,
    pub title: Option<String>,
    pub html: String,
    pub source: String,
}

/// Fetches Gemini resources and turns responses into [`ProxyOutcome`]s.
pub struct ProxyService {
    client: Arc<dyn GeminiClient>,
}

impl ProxyService {
    pub fn new(client: Arc<dyn GeminiClient>) -> Self {
        Self { client }
    }

    /// Number of hosts pinned by the underlying client.
    pub fn pinned_hosts(&self) -> usize {
        self.client.pinned_hosts()
    }

    /// Fetches `target` and classifies the response.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for requests that cannot be sent
    /// (e.g. URL too long) and [`AppError::BadGateway`] for transport or
    /// protocol failures.
    pub async fn fetch(&self, target: &ProxyTarget) -> Result<ProxyOutcome, AppError> {
        let request = GeminiRequest::new(
            &target.host,
            crate::domain::gemini::DEFAULT_PORT,
            &target.path,
            target.query.as_deref(),
        )?;

        let response = self.client.fetch(&request).await?;

        Ok(classify(&request, target, response))
    }
}

fn classify(request: &GeminiRequest, target: &ProxyTarget, response: GeminiResponse) -> ProxyOutcome {
    let current_path = target.proxy_path();

    match response.category() {
        StatusCategory::Success => {
            let mime = response.mime();
            let body = response.body.unwrap_or_default();

            if mime.is_gemtext() {
                let charset = mime.charset().unwrap_or_else(|| "UTF-8".to_string());
                let source = decode_text(&body, &charset);
                let lines = gemtext::parse(&source);
                let html = gemtext::render_html(&lines, |href| {
                    proxied_href(request.url(), href, &current_path)
                        .unwrap_or_else(|| href.to_string())
                });

                ProxyOutcome::Gemtext(GemtextPage {
                    url: response.url,
                    title: gemtext::title(&lines).map(str::to_string),
                    html,
                    source,
                })
            } else {
                ProxyOutcome::Raw {
                    content_type: mime.content_type(),
                    body,
                }
            }
        }
        StatusCategory::Redirect => ProxyOutcome::Redirect {
            status: response.status,
            proxied: proxied_href(request.url(), &response.meta, &current_path),
            target: response.meta,
        },
        StatusCategory::Input => ProxyOutcome::Input {
            status: response.status,
            sensitive: response.status == 11,
            prompt: if response.meta.trim().is_empty() {
                DEFAULT_INPUT_PROMPT.to_string()
            } else {
                response.meta
            },
        },
        StatusCategory::TemporaryFailure
        | StatusCategory::PermanentFailure
        | StatusCategory::CertificateRequired => ProxyOutcome::Failure {
            status: response.status,
            message: response.meta,
        },
    }
}

/// Resolves `href` against the page URL and applies the link policy.
///
/// Returns `None` when the link should be left as authored.
pub fn proxied_href(base: &Url, href: &str, current_path: &str) -> Option<String> {
    let resolved = base.join(href).map(String::from).unwrap_or_default();
    rewrite_link(&resolved, href, current_path)
}

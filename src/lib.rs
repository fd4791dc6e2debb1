//! # Gemini Proxy
//!
//! An HTTP front end for the Gemini protocol, built with Axum.
//!
//! Requests to `/{host}/{path}` are fetched from `gemini://{host}/{path}`;
//! gemtext documents are rendered to HTML, other content is passed through.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Gemini protocol model, gemtext, link policy
//! - **Application Layer** ([`application`]) - Fetching and classifying responses
//! - **Infrastructure Layer** ([`infrastructure`]) - TLS client with TOFU pinning
//! - **API Layer** ([`api`]) - JSON endpoints and HTTP middleware
//! - **Web Layer** ([`web`]) - HTML pages for proxied content
//!
//! ## Features
//!
//! - Gemtext to HTML rendering with links rewritten to proxy paths
//! - Input (status 1x) prompts as HTML forms
//! - Trust-on-first-use certificate pinning
//! - Rate limiting and observability
//!
//! ## Quick Start
//!
//! ```bash
//! export LISTEN="127.0.0.1:8965"  # Optional
//! cargo run
//! # then open http://127.0.0.1:8965/geminiprotocol.net/
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;

pub mod config;
pub mod server;

pub mod routes;
pub mod web;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{ProxyOutcome, ProxyService, ProxyTarget};
    pub use crate::domain::client::GeminiClient;
    pub use crate::domain::gemini::{GeminiError, GeminiRequest, GeminiResponse};
    pub use crate::domain::link_policy::{LinkInterceptor, rewrite_link};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}

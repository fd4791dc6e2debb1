//! Application layer services implementing the proxy's behavior.
//!
//! Services consume the domain's client trait and provide a clean API for
//! HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::proxy_service::ProxyService`] - Fetching Gemini resources and
//!   classifying responses for presentation

pub mod services;

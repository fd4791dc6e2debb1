//! Business logic services for the application layer.

pub mod proxy_service;

pub use proxy_service::{GemtextPage, ProxyOutcome, ProxyService, ProxyTarget};

//! Domain layer: the Gemini protocol model, gemtext handling and the
//! link-click policy.
//!
//! # Modules
//!
//! - [`gemini`] - Requests, response headers, status categories, MIME types
//! - [`client`] - The [`client::GeminiClient`] trait implemented by the infrastructure layer
//! - [`gemtext`] - Gemtext parser and HTML generator
//! - [`link_policy`] - Rewriting of followed links into proxy paths
//!
//! The domain layer has no dependencies on infrastructure or presentation layers.

pub mod client;
pub mod gemini;
pub mod gemtext;
pub mod link_policy;

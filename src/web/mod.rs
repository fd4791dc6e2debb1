//! Web layer for browser-facing pages.
//!
//! Renders proxied Gemini content and the pages around it with Askama
//! templates.
//!
//! # Modules
//!
//! - [`handlers`] - Template rendering and proxy handlers
//! - [`routes`] - Route configuration

pub mod handlers;
pub mod routes;

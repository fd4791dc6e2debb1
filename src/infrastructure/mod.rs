//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete network implementations.
//!
//! # Modules
//!
//! - [`gemini`] - TLS Gemini client with trust-on-first-use certificate pinning

pub mod gemini;

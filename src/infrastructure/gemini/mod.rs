//! Gemini transport: TLS client, TOFU pinning and response reading.
//!
//! Provides [`TlsGeminiClient`], the production [`crate::domain::client::GeminiClient`].

mod protocol;
mod tls_client;
mod tofu;

pub use protocol::read_response;
pub use tls_client::{ClientSettings, TlsGeminiClient};
pub use tofu::{KnownHost, KnownHosts, TofuOutcome, TofuVerifier, fingerprint};

//! Client trait for performing Gemini requests.

use crate::domain::gemini::{GeminiError, GeminiRequest, GeminiResponse};
use async_trait::async_trait;

/// Performs Gemini requests.
///
/// # Implementations
///
/// - [`crate::infrastructure::gemini::TlsGeminiClient`] - TLS client with TOFU certificate pinning
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeminiClient: Send + Sync {
    /// Sends `request` and reads the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError`] on connection, TLS, timeout or protocol failures.
    async fn fetch(&self, request: &GeminiRequest) -> Result<GeminiResponse, GeminiError>;

    /// Number of hosts whose certificate is currently pinned.
    fn pinned_hosts(&self) -> usize;
}

//! TLS Gemini client built on tokio-rustls.

use super::protocol::read_response;
use super::tofu::{KnownHosts, TofuVerifier};
use crate::domain::client::GeminiClient;
use crate::domain::gemini::{DEFAULT_MAX_RESPONSE_BYTES, GeminiError, GeminiRequest, GeminiResponse};
use async_trait::async_trait;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

/// Transport settings for [`TlsGeminiClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Timeout for a single TCP connect attempt.
    pub connect_timeout: Duration,
    /// Timeout for the whole exchange, connect retries included.
    pub request_timeout: Duration,
    /// Cap on response bodies.
    pub max_response_bytes: usize,
    /// Additional TCP connect attempts after the first failure.
    pub connect_retries: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            connect_retries: 2,
        }
    }
}

/// Gemini client speaking TLS 1.2+ with TOFU certificate pinning.
pub struct TlsGeminiClient {
    connector: TlsConnector,
    known_hosts: Arc<KnownHosts>,
    settings: ClientSettings,
}

impl TlsGeminiClient {
    /// Creates a client with an empty certificate store.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::Tls`] if the TLS configuration cannot be built.
    pub fn new(settings: ClientSettings) -> Result<Self, GeminiError> {
        Self::with_known_hosts(settings, Arc::new(KnownHosts::new()))
    }

    /// Creates a client sharing an existing certificate store.
    pub fn with_known_hosts(
        settings: ClientSettings,
        known_hosts: Arc<KnownHosts>,
    ) -> Result<Self, GeminiError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = TofuVerifier::new(known_hosts.clone(), provider.clone());

        let config = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
            .map_err(|e| GeminiError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            known_hosts,
            settings,
        })
    }

    pub fn known_hosts(&self) -> &KnownHosts {
        &self.known_hosts
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream, GeminiError> {
        let connect_timeout = self.settings.connect_timeout;
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(1))
            .map(jitter)
            .take(self.settings.connect_retries);

        Retry::spawn(strategy, || async move {
            debug!(host = %host, port, "Connecting");
            match timeout(connect_timeout, TcpStream::connect((host, port))).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => {
                    warn!(host = %host, port, error = %e, "Connect attempt failed");
                    Err(GeminiError::Io(e))
                }
                Err(_) => {
                    warn!(host = %host, port, "Connect attempt timed out");
                    Err(GeminiError::Timeout(connect_timeout))
                }
            }
        })
        .await
    }

    async fn exchange(&self, request: &GeminiRequest) -> Result<GeminiResponse, GeminiError> {
        let host = request
            .host()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let tcp = self.connect(&host, request.port()).await?;

        let server_name =
            ServerName::try_from(host).map_err(|e| GeminiError::InvalidUrl(e.to_string()))?;
        let mut stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| GeminiError::Tls(e.to_string()))?;

        stream.write_all(&request.to_wire()).await?;
        stream.flush().await?;

        let response = read_response(
            &mut stream,
            request.url().as_str(),
            self.settings.max_response_bytes,
        )
        .await;

        let _ = stream.shutdown().await;

        response
    }
}

#[async_trait]
impl GeminiClient for TlsGeminiClient {
    async fn fetch(&self, request: &GeminiRequest) -> Result<GeminiResponse, GeminiError> {
        let limit = self.settings.request_timeout;

        let response = timeout(limit, self.exchange(request))
            .await
            .map_err(|_| GeminiError::Timeout(limit))??;

        info!(
            url = %request.url(),
            status = response.status,
            bytes = response.body.as_ref().map_or(0, Vec::len),
            "Gemini request completed"
        );

        Ok(response)
    }

    fn pinned_hosts(&self) -> usize {
        self.known_hosts.len()
    }
}

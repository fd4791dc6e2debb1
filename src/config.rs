//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ```bash
//! export LISTEN="127.0.0.1:8965"
//! export GEMINI_REQUEST_TIMEOUT="30"
//! ```
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `127.0.0.1:8965`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `GEMINI_CONNECT_TIMEOUT` - TCP connect timeout in seconds (default: 10)
//! - `GEMINI_REQUEST_TIMEOUT` - Whole-request timeout in seconds (default: 30)
//! - `GEMINI_MAX_RESPONSE_BYTES` - Response body cap (default: 131072)
//! - `GEMINI_CONNECT_RETRIES` - Extra connect attempts (default: 2)
//! - `BEHIND_PROXY` - Trust forwarded client IP headers (default: `false`)
//! - `STATIC_DIR` - Static asset directory (default: `static`)

use crate::domain::gemini::DEFAULT_MAX_RESPONSE_BYTES;
use crate::infrastructure::gemini::ClientSettings;
use anyhow::Result;
use std::env;
use std::time::Duration;

/// Smallest accepted response body cap.
const MIN_RESPONSE_BYTES: usize = 1024;

/// Largest accepted response body cap.
const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// Timeout for a single TCP connect attempt, in seconds.
    pub connect_timeout_seconds: u64,
    /// Timeout for a complete Gemini exchange, in seconds.
    pub request_timeout_seconds: u64,
    /// Bodies beyond this size are truncated.
    pub max_response_bytes: usize,
    /// Additional TCP connect attempts after a failure.
    pub connect_retries: usize,
    /// When true, rate limiting reads client IP from X-Forwarded-For / X-Real-IP headers.
    /// Enable only when the service is behind a trusted reverse proxy.
    pub behind_proxy: bool,
    pub static_dir: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Unset or unparsable numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8965".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let connect_timeout_seconds = parse_var("GEMINI_CONNECT_TIMEOUT", 10);
        let request_timeout_seconds = parse_var("GEMINI_REQUEST_TIMEOUT", 30);
        let max_response_bytes =
            parse_var("GEMINI_MAX_RESPONSE_BYTES", DEFAULT_MAX_RESPONSE_BYTES);
        let connect_retries = parse_var("GEMINI_CONNECT_RETRIES", 2);

        let behind_proxy = env::var("BEHIND_PROXY")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

        Ok(Self {
            listen_addr,
            log_level,
            log_format,
            connect_timeout_seconds,
            request_timeout_seconds,
            max_response_bytes,
            connect_retries,
            behind_proxy,
            static_dir,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is not `host:port`
    /// - a timeout is zero, or the request timeout is shorter than the connect timeout
    /// - `max_response_bytes` is outside 1 KiB ..= 64 MiB
    /// - `connect_retries` exceeds 10
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if self.connect_timeout_seconds == 0 {
            anyhow::bail!("GEMINI_CONNECT_TIMEOUT must be greater than 0");
        }

        if self.request_timeout_seconds < self.connect_timeout_seconds {
            anyhow::bail!(
                "GEMINI_REQUEST_TIMEOUT ({}) must not be shorter than GEMINI_CONNECT_TIMEOUT ({})",
                self.request_timeout_seconds,
                self.connect_timeout_seconds
            );
        }

        if !(MIN_RESPONSE_BYTES..=MAX_RESPONSE_BYTES).contains(&self.max_response_bytes) {
            anyhow::bail!(
                "GEMINI_MAX_RESPONSE_BYTES must be between {} and {}, got {}",
                MIN_RESPONSE_BYTES,
                MAX_RESPONSE_BYTES,
                self.max_response_bytes
            );
        }

        if self.connect_retries > 10 {
            anyhow::bail!(
                "GEMINI_CONNECT_RETRIES must be at most 10, got {}",
                self.connect_retries
            );
        }

        Ok(())
    }

    /// Transport settings for the Gemini client.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            max_response_bytes: self.max_response_bytes,
            connect_retries: self.connect_retries,
        }
    }

    /// Prints configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!(
            "  Gemini timeouts: connect {}s, request {}s",
            self.connect_timeout_seconds,
            self.request_timeout_seconds
        );
        tracing::info!("  Max response size: {} bytes", self.max_response_bytes);
        tracing::info!("  Connect retries: {}", self.connect_retries);
        tracing::info!("  Behind proxy: {}", self.behind_proxy);
        tracing::info!("  Static directory: {}", self.static_dir);
    }
}

fn parse_var<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    let Ok(raw) = env::var(name) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                variable = name,
                value = %raw,
                default = %default,
                "Ignoring unparsable configuration value"
            );
            default
        }
    }
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

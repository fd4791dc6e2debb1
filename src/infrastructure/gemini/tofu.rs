//! Trust-on-first-use certificate pinning.
//!
//! Gemini servers overwhelmingly use self-signed certificates, so CA
//! validation is not useful. Instead the first certificate seen for a host is
//! pinned by its SHA-256 fingerprint and every later connection must present
//! the same certificate.

use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// A pinned certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownHost {
    pub fingerprint: String,
    pub first_seen: DateTime<Utc>,
}

/// Result of checking a certificate against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TofuOutcome {
    /// First contact; the certificate is now pinned.
    Pinned,
    /// The certificate matches the pinned one.
    Trusted,
    /// A different certificate is pinned for this host.
    Mismatch { expected: String },
}

/// In-memory store of pinned certificates, keyed by host.
#[derive(Debug, Default)]
pub struct KnownHosts {
    entries: Mutex<HashMap<String, KnownHost>>,
}

impl KnownHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `fingerprint` for `host`, pinning it on first contact.
    pub fn check(&self, host: &str, fingerprint: &str) -> TofuOutcome {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get(host) {
            Some(known) if known.fingerprint == fingerprint => TofuOutcome::Trusted,
            Some(known) => TofuOutcome::Mismatch {
                expected: known.fingerprint.clone(),
            },
            None => {
                entries.insert(
                    host.to_string(),
                    KnownHost {
                        fingerprint: fingerprint.to_string(),
                        first_seen: Utc::now(),
                    },
                );
                TofuOutcome::Pinned
            }
        }
    }

    pub fn get(&self, host: &str) -> Option<KnownHost> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hex-encoded SHA-256 digest of a DER certificate.
pub fn fingerprint(certificate: &[u8]) -> String {
    hex::encode(Sha256::digest(certificate))
}

/// rustls verifier enforcing TOFU pinning instead of CA validation.
///
/// Handshake signatures are still verified with the provider's algorithms.
#[derive(Debug)]
pub struct TofuVerifier {
    known_hosts: Arc<KnownHosts>,
    provider: Arc<CryptoProvider>,
}

impl TofuVerifier {
    pub fn new(known_hosts: Arc<KnownHosts>, provider: Arc<CryptoProvider>) -> Self {
        Self {
            known_hosts,
            provider,
        }
    }
}

fn host_key(server_name: &ServerName<'_>) -> String {
    match server_name {
        ServerName::DnsName(name) => name.as_ref().to_ascii_lowercase(),
        ServerName::IpAddress(ip) => std::net::IpAddr::from(*ip).to_string(),
        other => format!("{other:?}"),
    }
}

impl ServerCertVerifier for TofuVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = host_key(server_name);
        let actual = fingerprint(end_entity.as_ref());

        match self.known_hosts.check(&host, &actual) {
            TofuOutcome::Trusted => Ok(ServerCertVerified::assertion()),
            TofuOutcome::Pinned => {
                info!(host = %host, fingerprint = %actual, "Pinned certificate on first use");
                Ok(ServerCertVerified::assertion())
            }
            TofuOutcome::Mismatch { expected } => {
                warn!(
                    host = %host,
                    expected = %expected,
                    actual = %actual,
                    "Certificate does not match pinned fingerprint"
                );
                Err(rustls::Error::General(format!(
                    "certificate for {host} does not match pinned fingerprint {expected}"
                )))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_use_pins() {
        let store = KnownHosts::new();
        assert!(store.is_empty());

        assert_eq!(store.check("example.org", "aa"), TofuOutcome::Pinned);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("example.org").unwrap().fingerprint, "aa");
    }

    #[test]
    fn test_same_certificate_trusted() {
        let store = KnownHosts::new();
        store.check("example.org", "aa");

        assert_eq!(store.check("example.org", "aa"), TofuOutcome::Trusted);
    }

    #[test]
    fn test_changed_certificate_rejected() {
        let store = KnownHosts::new();
        store.check("example.org", "aa");

        assert_eq!(
            store.check("example.org", "bb"),
            TofuOutcome::Mismatch {
                expected: "aa".to_string()
            }
        );
        assert_eq!(store.get("example.org").unwrap().fingerprint, "aa");
    }

    #[test]
    fn test_hosts_are_independent() {
        let store = KnownHosts::new();
        store.check("a.example", "aa");

        assert_eq!(store.check("b.example", "bb"), TofuOutcome::Pinned);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_host_key_lowercases_dns_names() {
        let name = ServerName::try_from("Example.ORG").unwrap();
        assert_eq!(host_key(&name), "example.org");
    }
}

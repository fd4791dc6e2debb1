//! Gemini protocol model: requests, response headers, status categories and
//! MIME metadata.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Default Gemini port.
pub const DEFAULT_PORT: u16 = 1965;

/// Maximum length of a request URL in bytes, excluding CRLF.
pub const MAX_URL_BYTES: usize = 1024;

/// Maximum length of a response header line in bytes, including CRLF.
pub const HEADER_LINE_SIZE: usize = 1029;

/// Default cap on response bodies.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 128 * 1024;

/// MIME type assumed when a success response carries an empty meta.
pub const DEFAULT_MIME: &str = "text/gemini; charset=utf-8";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-6][0-9]) (.{1,1024})\r\n$").expect("valid header regex"));

/// Errors raised while talking to a Gemini server.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("Invalid Gemini URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(u16),

    #[error("Gemini URL is too long ({0} bytes, limit is 1024)")]
    UrlTooLong(usize),

    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Server sent a {0}-byte header line")]
    HeaderTooLong(usize),

    #[error("Server sent an improperly formatted header line")]
    MalformedHeader,
}

impl GeminiError {
    /// Whether the error was caused by the request itself rather than the
    /// remote server or the network.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::InvalidPort(_) | Self::UrlTooLong(_)
        )
    }
}

/// A validated Gemini request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiRequest {
    url: Url,
    host: String,
    port: u16,
}

impl GeminiRequest {
    /// Builds a request for `host`, `port` and `path`, with an optional query.
    ///
    /// The port is left out of the URL when it is [`DEFAULT_PORT`]. The query
    /// is percent-encoded.
    ///
    /// # Errors
    ///
    /// - [`GeminiError::InvalidPort`] for port 0
    /// - [`GeminiError::InvalidUrl`] if the parts do not form a URL
    /// - [`GeminiError::UrlTooLong`] if the URL exceeds [`MAX_URL_BYTES`]
    pub fn new(
        host: &str,
        port: u16,
        path: &str,
        query: Option<&str>,
    ) -> Result<Self, GeminiError> {
        if port == 0 {
            return Err(GeminiError::InvalidPort(port));
        }
        if host.is_empty() {
            return Err(GeminiError::InvalidUrl("missing host".to_string()));
        }

        let port_string = if port == DEFAULT_PORT {
            String::new()
        } else {
            format!(":{port}")
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let mut url = Url::parse(&format!("gemini://{host}{port_string}{path}"))
            .map_err(|e| GeminiError::InvalidUrl(e.to_string()))?;
        if let Some(query) = query {
            url.set_query(Some(query));
        }

        Self::from_url(url)
    }

    /// Parses an absolute `gemini://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidUrl`] for malformed URLs, other schemes,
    /// or URLs without a host.
    pub fn parse(input: &str) -> Result<Self, GeminiError> {
        let url = Url::parse(input).map_err(|e| GeminiError::InvalidUrl(e.to_string()))?;
        Self::from_url(url)
    }

    fn from_url(mut url: Url) -> Result<Self, GeminiError> {
        if url.scheme() != "gemini" {
            return Err(GeminiError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        url.set_fragment(None);

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| GeminiError::InvalidUrl("missing host".to_string()))?
            .to_string();
        let port = url.port().unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(GeminiError::InvalidPort(port));
        }
        if url.port() == Some(DEFAULT_PORT) {
            let _ = url.set_port(None);
        }
        if url.path().is_empty() {
            url.set_path("/");
        }

        let length = url.as_str().len();
        if length > MAX_URL_BYTES {
            return Err(GeminiError::UrlTooLong(length));
        }

        Ok(Self { url, host, port })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The request line sent on the wire: the URL followed by CRLF.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.url.as_str().len() + 2);
        line.extend_from_slice(self.url.as_str().as_bytes());
        line.extend_from_slice(b"\r\n");
        line
    }
}

/// Response status category, the status code rounded down to a multiple of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Input,
    Success,
    Redirect,
    TemporaryFailure,
    PermanentFailure,
    CertificateRequired,
}

impl StatusCategory {
    pub fn from_code(code: u8) -> Option<Self> {
        match code - code % 10 {
            10 => Some(Self::Input),
            20 => Some(Self::Success),
            30 => Some(Self::Redirect),
            40 => Some(Self::TemporaryFailure),
            50 => Some(Self::PermanentFailure),
            60 => Some(Self::CertificateRequired),
            _ => None,
        }
    }
}

/// A parsed response header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: u8,
    pub meta: String,
}

impl ResponseHeader {
    /// Parses a raw header line, CRLF included.
    ///
    /// # Errors
    ///
    /// - [`GeminiError::HeaderTooLong`] if the line exceeds [`HEADER_LINE_SIZE`]
    /// - [`GeminiError::MalformedHeader`] if it is not `<digit><digit> <meta>\r\n`
    pub fn parse(line: &[u8]) -> Result<Self, GeminiError> {
        if line.len() > HEADER_LINE_SIZE {
            return Err(GeminiError::HeaderTooLong(line.len()));
        }

        let text = String::from_utf8_lossy(line);
        let caps = HEADER_RE
            .captures(&text)
            .ok_or(GeminiError::MalformedHeader)?;

        let status = caps[1]
            .parse::<u8>()
            .map_err(|_| GeminiError::MalformedHeader)?;

        Ok(Self {
            status,
            meta: caps[2].to_string(),
        })
    }

    pub fn category(&self) -> StatusCategory {
        // The header pattern only admits codes 10..=69.
        StatusCategory::from_code(self.status).unwrap_or(StatusCategory::PermanentFailure)
    }
}

/// A complete Gemini response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiResponse {
    pub url: String,
    pub status: u8,
    pub meta: String,
    /// Present only for success responses.
    pub body: Option<Vec<u8>>,
}

impl GeminiResponse {
    pub fn category(&self) -> StatusCategory {
        StatusCategory::from_code(self.status).unwrap_or(StatusCategory::PermanentFailure)
    }

    /// The response MIME type; meaningful for success responses only.
    pub fn mime(&self) -> MimeType {
        if self.meta.trim().is_empty() {
            MimeType::parse(DEFAULT_MIME)
        } else {
            MimeType::parse(&self.meta)
        }
    }
}

/// A MIME type with parameters, e.g. `text/gemini; charset=utf-8; lang=en`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    /// Lower-cased `type/subtype`.
    pub essence: String,
    /// Parameters in order, keys lower-cased.
    pub params: Vec<(String, String)>,
}

impl MimeType {
    pub fn parse(input: &str) -> Self {
        let mut parts = input.split(';');
        let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();

        let params = parts
            .filter_map(|part| {
                let (key, value) = part.split_once('=')?;
                let key = key.trim().to_ascii_lowercase();
                if key.is_empty() {
                    return None;
                }
                let value = value.trim().trim_matches('"').to_string();
                Some((key, value))
            })
            .collect();

        Self { essence, params }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_text(&self) -> bool {
        self.essence.starts_with("text/")
    }

    pub fn is_gemtext(&self) -> bool {
        self.essence == "text/gemini"
    }

    /// Charset of a text type, `UTF-8` when unspecified. `None` for non-text types.
    pub fn charset(&self) -> Option<String> {
        if !self.is_text() {
            return None;
        }
        Some(self.param("charset").unwrap_or("UTF-8").to_string())
    }

    /// Value for an HTTP `Content-Type` header.
    pub fn content_type(&self) -> String {
        match self.charset() {
            Some(charset) => format!("{}; charset={}", self.essence, charset),
            None => self.essence.clone(),
        }
    }
}

/// Decodes a text body in the given charset.
///
/// Charset labels are resolved the way browsers resolve them, so
/// `iso-8859-1` and `latin1` decode as windows-1252. Malformed sequences are
/// replaced. Unknown labels are decoded as UTF-8 after a warning.
pub fn decode_text(body: &[u8], charset: &str) -> String {
    let encoding = Encoding::for_label(charset.trim().as_bytes()).unwrap_or_else(|| {
        tracing::warn!(charset = %charset, "Unknown charset, decoding as UTF-8");
        UTF_8
    });

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_default_port_omitted() {
        let request = GeminiRequest::new("example.org", 1965, "/path", None).unwrap();
        assert_eq!(request.url().as_str(), "gemini://example.org/path");
        assert_eq!(request.host(), "example.org");
        assert_eq!(request.port(), 1965);
    }

    #[test]
    fn test_request_custom_port_kept() {
        let request = GeminiRequest::new("example.org", 1966, "/", None).unwrap();
        assert_eq!(request.url().as_str(), "gemini://example.org:1966/");
        assert_eq!(request.port(), 1966);
    }

    #[test]
    fn test_request_query_is_encoded() {
        let request =
            GeminiRequest::new("example.org", 1965, "/search", Some("hello world")).unwrap();
        assert_eq!(
            request.url().as_str(),
            "gemini://example.org/search?hello%20world"
        );
    }

    #[test]
    fn test_request_path_gets_leading_slash() {
        let request = GeminiRequest::new("example.org", 1965, "docs", None).unwrap();
        assert_eq!(request.url().path(), "/docs");
    }

    #[test]
    fn test_request_rejects_port_zero() {
        let result = GeminiRequest::new("example.org", 0, "/", None);
        assert!(matches!(result, Err(GeminiError::InvalidPort(0))));
    }

    #[test]
    fn test_request_rejects_long_url() {
        let path = format!("/{}", "a".repeat(1100));
        let result = GeminiRequest::new("example.org", 1965, &path, None);
        assert!(matches!(result, Err(GeminiError::UrlTooLong(_))));
    }

    #[test]
    fn test_request_wire_format() {
        let request = GeminiRequest::new("example.org", 1965, "/", None).unwrap();
        assert_eq!(request.to_wire(), b"gemini://example.org/\r\n".to_vec());
    }

    #[test]
    fn test_parse_request_url() {
        let request = GeminiRequest::parse("gemini://example.org:1965/a#frag").unwrap();
        assert_eq!(request.url().as_str(), "gemini://example.org/a");
        assert_eq!(request.port(), 1965);

        let request = GeminiRequest::parse("gemini://example.org").unwrap();
        assert_eq!(request.url().as_str(), "gemini://example.org/");
    }

    #[test]
    fn test_parse_request_rejects_other_scheme() {
        let result = GeminiRequest::parse("https://example.org/");
        assert!(matches!(result, Err(GeminiError::InvalidUrl(_))));
        assert!(result.unwrap_err().is_client_error());
    }

    #[test]
    fn test_header_parse_success() {
        let header = ResponseHeader::parse(b"20 text/gemini\r\n").unwrap();
        assert_eq!(header.status, 20);
        assert_eq!(header.meta, "text/gemini");
        assert_eq!(header.category(), StatusCategory::Success);
    }

    #[test]
    fn test_header_parse_redirect() {
        let header = ResponseHeader::parse(b"31 gemini://example.org/new\r\n").unwrap();
        assert_eq!(header.status, 31);
        assert_eq!(header.category(), StatusCategory::Redirect);
    }

    #[test]
    fn test_header_parse_rejects_malformed() {
        for line in [
            &b"20text/gemini\r\n"[..],
            b"2 text/gemini\r\n",
            b"70 nope\r\n",
            b"20 text/gemini\n",
            b"20 \r\n",
            b"ab text\r\n",
        ] {
            assert!(
                matches!(ResponseHeader::parse(line), Err(GeminiError::MalformedHeader)),
                "accepted {:?}",
                String::from_utf8_lossy(line)
            );
        }
    }

    #[test]
    fn test_header_parse_rejects_oversized() {
        let mut line = b"20 ".to_vec();
        line.extend(std::iter::repeat_n(b'x', 1100));
        line.extend_from_slice(b"\r\n");
        assert!(matches!(
            ResponseHeader::parse(&line),
            Err(GeminiError::HeaderTooLong(_))
        ));
    }

    #[test]
    fn test_status_category() {
        assert_eq!(StatusCategory::from_code(10), Some(StatusCategory::Input));
        assert_eq!(StatusCategory::from_code(11), Some(StatusCategory::Input));
        assert_eq!(StatusCategory::from_code(44), Some(StatusCategory::TemporaryFailure));
        assert_eq!(StatusCategory::from_code(51), Some(StatusCategory::PermanentFailure));
        assert_eq!(StatusCategory::from_code(62), Some(StatusCategory::CertificateRequired));
        assert_eq!(StatusCategory::from_code(7), None);
    }

    #[test]
    fn test_mime_parse() {
        let mime = MimeType::parse("Text/Gemini; charset=\"ISO-8859-1\"; lang=en");
        assert_eq!(mime.essence, "text/gemini");
        assert!(mime.is_gemtext());
        assert_eq!(mime.param("lang"), Some("en"));
        assert_eq!(mime.charset().as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_mime_charset_defaults() {
        assert_eq!(
            MimeType::parse("text/plain").charset().as_deref(),
            Some("UTF-8")
        );
        assert_eq!(MimeType::parse("image/png").charset(), None);
    }

    #[test]
    fn test_mime_content_type() {
        assert_eq!(
            MimeType::parse("text/plain").content_type(),
            "text/plain; charset=UTF-8"
        );
        assert_eq!(MimeType::parse("image/png").content_type(), "image/png");
    }

    #[test]
    fn test_response_empty_meta_defaults_to_gemtext() {
        let response = GeminiResponse {
            url: "gemini://example.org/".to_string(),
            status: 20,
            meta: " ".to_string(),
            body: Some(Vec::new()),
        };
        assert!(response.mime().is_gemtext());
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text("héllo".as_bytes(), "utf-8"), "héllo");
        assert_eq!(decode_text(b"a\xffb", "UTF-8"), "a\u{fffd}b");
    }

    #[test]
    fn test_decode_text_declared_charset() {
        assert_eq!(decode_text(b"caf\xe9", "ISO-8859-1"), "caf\u{e9}");
        assert_eq!(decode_text(b"caf\xe9", " latin1 "), "caf\u{e9}");
        assert_eq!(decode_text(b"\xcf\xf0\xe8", "windows-1251"), "\u{41f}\u{440}\u{438}");
        assert_eq!(decode_text(b"plain", "us-ascii"), "plain");
    }

    #[test]
    fn test_decode_text_unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_text("h\u{e9}".as_bytes(), "x-no-such-charset"), "h\u{e9}");
    }
}

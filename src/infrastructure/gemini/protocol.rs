//! Reading Gemini responses from a byte stream.

use crate::domain::gemini::{
    GeminiError, GeminiResponse, HEADER_LINE_SIZE, ResponseHeader, StatusCategory,
};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, warn};

/// Reads a response header and, for success responses, the body.
///
/// The body is read until EOF and capped at `max_body_bytes`; anything beyond
/// the cap is discarded. A peer that closes without a TLS close-notify is
/// treated as a normal end of stream, which is common among Gemini servers.
///
/// # Errors
///
/// - [`GeminiError::HeaderTooLong`] / [`GeminiError::MalformedHeader`] for bad headers
/// - [`GeminiError::Io`] for stream failures
pub async fn read_response<R>(
    stream: R,
    url: &str,
    max_body_bytes: usize,
) -> Result<GeminiResponse, GeminiError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);

    let mut line = Vec::with_capacity(128);
    (&mut reader)
        .take(HEADER_LINE_SIZE as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;

    let header = ResponseHeader::parse(&line)?;
    debug!(url = %url, status = header.status, meta = %header.meta, "Received response header");

    let body = if header.category() == StatusCategory::Success {
        Some(read_body(&mut reader, url, max_body_bytes).await?)
    } else {
        None
    };

    Ok(GeminiResponse {
        url: url.to_string(),
        status: header.status,
        meta: header.meta,
        body,
    })
}

async fn read_body<R>(reader: &mut R, url: &str, max_body_bytes: usize) -> Result<Vec<u8>, GeminiError>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        let room = max_body_bytes - body.len();
        if read > room {
            body.extend_from_slice(&chunk[..room]);
            warn!(url = %url, limit = max_body_bytes, "Response body truncated");
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, duplex};

    async fn respond(raw: &[u8], limit: usize) -> Result<GeminiResponse, GeminiError> {
        let (client, mut server) = duplex(64 * 1024);
        server.write_all(raw).await.unwrap();
        drop(server);
        read_response(client, "gemini://example.org/", limit).await
    }

    #[tokio::test]
    async fn test_read_success_with_body() {
        let response = respond(b"20 text/gemini\r\n# Hello\n", 1024)
            .await
            .unwrap();

        assert_eq!(response.status, 20);
        assert_eq!(response.meta, "text/gemini");
        assert_eq!(response.body.as_deref(), Some(&b"# Hello\n"[..]));
        assert_eq!(response.url, "gemini://example.org/");
    }

    #[tokio::test]
    async fn test_read_non_success_has_no_body() {
        let response = respond(b"51 Not found\r\nignored", 1024).await.unwrap();

        assert_eq!(response.status, 51);
        assert_eq!(response.meta, "Not found");
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn test_read_truncates_body() {
        let mut raw = b"20 text/plain\r\n".to_vec();
        raw.extend(std::iter::repeat_n(b'x', 300));

        let response = respond(&raw, 100).await.unwrap();

        assert_eq!(response.body.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_read_body_exactly_at_limit() {
        let mut raw = b"20 text/plain\r\n".to_vec();
        raw.extend(std::iter::repeat_n(b'x', 100));

        let response = respond(&raw, 100).await.unwrap();

        assert_eq!(response.body.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_read_empty_stream_is_malformed() {
        let result = respond(b"", 1024).await;
        assert!(matches!(result, Err(GeminiError::MalformedHeader)));
    }

    #[tokio::test]
    async fn test_read_header_without_newline_too_long() {
        let raw = vec![b'2'; 2000];
        let result = respond(&raw, 1024).await;
        assert!(matches!(result, Err(GeminiError::HeaderTooLong(_))));
    }
}

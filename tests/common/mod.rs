#![allow(dead_code)]

use async_trait::async_trait;
use gemini_proxy::application::services::ProxyService;
use gemini_proxy::domain::client::GeminiClient;
use gemini_proxy::domain::gemini::{GeminiError, GeminiRequest, GeminiResponse};
use gemini_proxy::state::AppState;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

/// Client answering from a fixed table of URLs.
///
/// Unknown URLs fail with a connection error, like an unreachable capsule.
#[derive(Default)]
pub struct StubGeminiClient {
    responses: HashMap<String, GeminiResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubGeminiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u8, meta: &str, body: Option<&[u8]>) -> Self {
        self.responses.insert(
            url.to_string(),
            GeminiResponse {
                url: url.to_string(),
                status,
                meta: meta.to_string(),
                body: body.map(<[u8]>::to_vec),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeminiClient for StubGeminiClient {
    async fn fetch(&self, request: &GeminiRequest) -> Result<GeminiResponse, GeminiError> {
        let url = request.url().as_str().to_string();
        self.requests.lock().unwrap().push(url.clone());

        self.responses.get(&url).cloned().ok_or_else(|| {
            GeminiError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        })
    }

    fn pinned_hosts(&self) -> usize {
        self.responses.len()
    }
}

pub fn create_test_state(client: Arc<StubGeminiClient>) -> AppState {
    AppState::new(Arc::new(ProxyService::new(client)))
}

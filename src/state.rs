use std::sync::Arc;

use crate::application::services::ProxyService;

#[derive(Clone)]
pub struct AppState {
    pub proxy_service: Arc<ProxyService>,
}

impl AppState {
    pub fn new(proxy_service: Arc<ProxyService>) -> Self {
        Self { proxy_service }
    }
}

use crate::service::ScribeService;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScribeService>,
}

impl AppState {
    pub fn new(service: Arc<ScribeService>) -> Self {
        Self { service }
    }
}

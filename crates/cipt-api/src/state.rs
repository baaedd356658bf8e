//! Application state shared across route handlers.

use std::sync::Arc;

use cipt_pipeline::ChatTransport;

/// Shared application state, cheap to clone into handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Outbound messaging channel.
    pub transport: Arc<dyn ChatTransport>,
    /// Bearer token required by protected endpoints.
    pub api_token: Arc<String>,
}

impl AppState {
    pub fn new(transport: Arc<dyn ChatTransport>, api_token: String) -> Self {
        Self {
            transport,
            api_token: Arc::new(api_token),
        }
    }
}

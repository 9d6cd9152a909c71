//! Shared application state for axum handlers.

use std::sync::Arc;

use llmrelay_providers::LocalLlmAdapter;

use crate::session::SessionVerifier;

/// Cloned into every handler; both members are read-only.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<LocalLlmAdapter>,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl AppState {
    pub fn new(adapter: LocalLlmAdapter, sessions: impl SessionVerifier + 'static) -> Self {
        Self {
            adapter: Arc::new(adapter),
            sessions: Arc::new(sessions),
        }
    }
}

//! `llmrelay serve`: build the adapter and run the gateway.

use anyhow::Result;
use tracing::{info, warn};

use llmrelay_core::config::load_config;
use llmrelay_gateway::{AppState, TokenSessions};
use llmrelay_providers::LocalLlmAdapter;

use crate::helpers;

/// Run the gateway until Ctrl+C.
pub async fn run() -> Result<()> {
    println!();
    helpers::print_banner();
    println!("  Mode: Gateway");
    println!();

    let config = load_config(None);
    let gateway = &config.gateway;

    if gateway.session_tokens.is_empty() {
        warn!("no session tokens configured; session-protected routes will answer 401");
    }

    let adapter = LocalLlmAdapter::new(config.local_llm.clone());
    info!(
        providers = adapter.configured_providers().len(),
        local_engine = adapter.settings().ollama_base_url().is_some(),
        delete_enabled = adapter.settings().enable_model_delete,
        "adapter ready"
    );

    let sessions = TokenSessions::new(gateway.session_tokens.clone());
    let state = AppState::new(adapter, sessions);

    println!("  Listening on http://{}:{}", gateway.host, gateway.port);
    println!("  Press Ctrl+C to stop");
    println!();

    llmrelay_gateway::serve(gateway, state).await
}

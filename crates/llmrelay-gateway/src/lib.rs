//! HTTP gateway for llmrelay.
//!
//! Maps the inbound routes onto [`LocalLlmAdapter`] operations:
//!
//! | Route | Session |
//! |---|---|
//! | `GET /health` | no |
//! | `GET /api/local-llm/providers` | no |
//! | `POST /api/local-llm/proxy` | no |
//! | `POST /api/local-llm/stream` | yes |
//! | `GET /api/local-llm/ollama/list` | yes |
//! | `POST /api/local-llm/ollama/delete` | yes, and delete enabled |
//!
//! [`LocalLlmAdapter`]: llmrelay_providers::LocalLlmAdapter

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod state;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use llmrelay_core::config::GatewayConfig;

pub use error::{ApiError, ApiResult};
pub use session::{Session, SessionVerifier, TokenSessions};
pub use state::AppState;

/// Build the router with every route and the logging layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/local-llm/providers", get(handlers::list_providers))
        .route("/api/local-llm/proxy", post(handlers::proxy_chat))
        .route("/api/local-llm/stream", post(handlers::stream_chat))
        .route("/api/local-llm/ollama/list", get(handlers::list_local_models))
        .route("/api/local-llm/ollama/delete", post(handlers::delete_local_model))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}

/// Bind to `{host}:{port}` and serve until Ctrl+C.
pub async fn serve(config: &GatewayConfig, state: AppState) -> Result<()> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway to {bind_addr}"))?;

    let addr = listener
        .local_addr()
        .context("failed to read gateway local address")?;
    info!("Gateway listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

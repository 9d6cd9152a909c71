//! Provider adapter for self-hosted LLM inference servers.
//!
//! # Architecture
//!
//! - [`catalog`]: lenient parsing of the configured provider list + resolution
//! - [`health`]: bounded reachability probes and the provider listing
//! - [`forward`]: chat forwarding, buffered or as a raw byte stream
//! - [`ollama`]: local engine list/delete pass-throughs
//! - [`error::RelayError`]: error taxonomy with HTTP status mapping
//!
//! Every operation hangs off [`LocalLlmAdapter`], which owns an HTTP client
//! and an explicit [`AdapterSettings`] snapshot.

pub mod catalog;
pub mod error;
pub mod forward;
pub mod health;
pub mod ollama;
mod transport;

use llmrelay_core::config::AdapterSettings;

// Re-export main types for convenience
pub use catalog::{parse_provider_data, resolve_provider, ModelEntry, ModelSpec, ProviderConfig};
pub use error::RelayError;
pub use forward::{ChatRequest, UpstreamStream};
pub use health::{Health, HealthStatus, ProviderInfo};

/// Identifier of the synthetic provider standing for the local Ollama engine.
pub const LOCAL_ENGINE_PROVIDER: &str = "ollama-local";

// ─────────────────────────────────────────────
// LocalLlmAdapter
// ─────────────────────────────────────────────

/// Entry point for every adapter operation.
///
/// Holds no per-request state: the provider catalog is re-parsed on every
/// call and health is never cached.
#[derive(Clone, Debug)]
pub struct LocalLlmAdapter {
    client: reqwest::Client,
    settings: AdapterSettings,
}

impl LocalLlmAdapter {
    /// Create an adapter with a default HTTP client.
    pub fn new(settings: AdapterSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    /// Create an adapter sharing an existing HTTP client.
    pub fn with_client(settings: AdapterSettings, client: reqwest::Client) -> Self {
        Self { client, settings }
    }

    /// The settings snapshot this adapter was built with.
    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Parse the configured provider list.
    pub fn configured_providers(&self) -> Vec<ProviderConfig> {
        parse_provider_data(self.settings.openai_compatible_data.as_ref())
    }
}

//! Configuration schema.
//!
//! Hierarchy: `Config` → `AdapterSettings` (+ `TimeoutConfig`), `GatewayConfig`.
//!
//! JSON on disk uses camelCase keys.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.llmrelay/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub local_llm: AdapterSettings,
    pub gateway: GatewayConfig,
}

// ─────────────────────────────────────────────
// Adapter settings
// ─────────────────────────────────────────────

/// Everything the provider adapter needs for one call.
///
/// Passed explicitly into every adapter entry point; the adapter itself
/// never looks at the process environment.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterSettings {
    /// Raw provider list. Either a JSON array or a string holding one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_compatible_data: Option<serde_json::Value>,
    /// Base URL of the local Ollama engine (e.g. `http://localhost:11434/api`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_base_url: Option<String>,
    /// Allow the local model delete pass-through.
    pub enable_model_delete: bool,
    /// Outbound request deadlines.
    pub timeouts: TimeoutConfig,
}

// Provider data carries API keys; keep it out of logs.
impl std::fmt::Debug for AdapterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSettings")
            .field(
                "openai_compatible_data",
                &self.openai_compatible_data.as_ref().map(|_| "<redacted>"),
            )
            .field("ollama_base_url", &self.ollama_base_url)
            .field("enable_model_delete", &self.enable_model_delete)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl AdapterSettings {
    /// The local engine base URL, if set to something non-empty.
    pub fn ollama_base_url(&self) -> Option<&str> {
        self.ollama_base_url.as_deref().filter(|s| !s.is_empty())
    }
}

/// Per-call deadlines in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeoutConfig {
    /// Health probe deadline.
    pub probe_ms: u64,
    /// Buffered chat forward deadline.
    pub chat_ms: u64,
    /// Time allowed for a streaming upstream to send its headers.
    pub stream_ms: u64,
    /// Ollama list/delete deadline.
    pub manage_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_ms: 1500,
            chat_ms: 10_000,
            stream_ms: 30_000,
            manage_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    pub fn chat(&self) -> Duration {
        Duration::from_millis(self.chat_ms)
    }

    pub fn stream(&self) -> Duration {
        Duration::from_millis(self.stream_ms)
    }

    pub fn manage(&self) -> Duration {
        Duration::from_millis(self.manage_ms)
    }
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// HTTP gateway settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Bearer token → user id. A request presenting a listed token has a session.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub session_tokens: HashMap<String, String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18800,
            session_tokens: HashMap::new(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

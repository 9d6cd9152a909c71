//! Provider catalog: parse the configured provider list and pick a target.
//!
//! The list arrives as a JSON array (or a string holding one). Parsing is
//! deliberately lenient: shape is validated upstream of this crate, so an
//! entry only needs a string `provider` and an array `models` to be kept,
//! and model entries are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::transport::is_truthy;

// ─────────────────────────────────────────────
// Model entries
// ─────────────────────────────────────────────

/// A well-formed model description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// Wire identifier sent upstream.
    pub api_name: String,
    /// Display label.
    pub ui_name: String,
    /// Whether the model accepts tool definitions.
    pub supports_tools: bool,
}

/// One element of a provider's `models` array.
///
/// Anything that isn't a complete [`ModelSpec`] is kept verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Described(ModelSpec),
    Opaque(Value),
}

impl ModelEntry {
    fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| ModelEntry::Opaque(value.clone()))
    }

    /// The upstream model name, when the entry has one.
    pub fn api_name(&self) -> Option<&str> {
        match self {
            ModelEntry::Described(spec) => Some(&spec.api_name),
            ModelEntry::Opaque(raw) => raw.get("apiName").and_then(Value::as_str),
        }
    }
}

// ─────────────────────────────────────────────
// ProviderConfig
// ─────────────────────────────────────────────

/// One configured upstream provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// Identifier, matched exactly when a request names a provider.
    pub provider: String,
    /// Root of the OpenAI-style API (often ending in `/v1`).
    pub base_url: Option<String>,
    /// Bearer token; empty means no `Authorization` header.
    pub api_key: Option<String>,
    /// Model catalog, in configured order.
    pub models: Vec<ModelEntry>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.bearer_token().map(|_| "<redacted>"))
            .field("models", &self.models.len())
            .finish()
    }
}

impl ProviderConfig {
    /// Build from one array element; `None` unless it has a string
    /// `provider` and an array `models`.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let provider = obj.get("provider")?.as_str()?;
        let models = obj.get("models")?.as_array()?;

        Some(ProviderConfig {
            provider: provider.to_string(),
            base_url: obj.get("baseUrl").and_then(Value::as_str).map(String::from),
            api_key: obj.get("apiKey").and_then(Value::as_str).map(String::from),
            models: models.iter().map(ModelEntry::from_value).collect(),
        })
    }

    /// Synthetic entry for the local Ollama engine.
    pub(crate) fn local_engine(base_url: &str) -> Self {
        ProviderConfig {
            provider: crate::LOCAL_ENGINE_PROVIDER.to_string(),
            base_url: Some(base_url.to_string()),
            api_key: Some(String::new()),
            models: Vec::new(),
        }
    }

    /// Base URL, if set to something non-empty.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|s| !s.is_empty())
    }

    /// API key, if set to something non-empty.
    pub fn bearer_token(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|s| !s.is_empty())
    }
}

// ─────────────────────────────────────────────
// Parsing & resolution
// ─────────────────────────────────────────────

/// Parse the raw provider list. Never fails: anything unusable yields an
/// empty list.
pub fn parse_provider_data(raw: Option<&Value>) -> Vec<ProviderConfig> {
    let Some(raw) = raw.filter(|v| is_truthy(v)) else {
        return Vec::new();
    };

    let decoded;
    let value = match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(v) => {
                decoded = v;
                &decoded
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse provider data as JSON");
                return Vec::new();
            }
        },
        other => other,
    };

    let Some(items) = value.as_array() else {
        warn!("Provider data is not a JSON array, ignoring");
        return Vec::new();
    };

    items.iter().filter_map(ProviderConfig::from_value).collect()
}

/// Pick the first provider named `name`, falling back to the first provider.
pub fn resolve_provider<'a>(
    providers: &'a [ProviderConfig],
    name: Option<&str>,
) -> Option<&'a ProviderConfig> {
    name.and_then(|n| providers.iter().find(|p| p.provider == n))
        .or_else(|| providers.first())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

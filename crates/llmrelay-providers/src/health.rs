//! Provider listing with live reachability probes.
//!
//! Every listing call re-parses the catalog and probes each provider that
//! has a base URL. Probes run concurrently, each under its own deadline, and
//! the listing returns once all of them have settled.

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::catalog::{ModelEntry, ProviderConfig};
use crate::transport::{join_url, send_with_deadline, SendFailure};
use crate::{LocalLlmAdapter, LOCAL_ENGINE_PROVIDER};

// ─────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────

/// Reachability verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Unknown,
    Ok,
    Unreachable,
}

/// Result of the most recent probe for one provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub status: HealthStatus,
    /// Round-trip time to response headers; only set when `status` is `Ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// `"timeout"`, `"HTTP <status>"`, or the transport error; only set when unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Health {
    fn unknown(provider: &str, base_url: Option<&str>) -> Self {
        Health {
            provider: provider.to_string(),
            base_url: base_url.map(String::from),
            status: HealthStatus::Unknown,
            latency_ms: None,
            error: None,
        }
    }

    fn record(&mut self, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Reachable { latency_ms } => {
                self.status = HealthStatus::Ok;
                self.latency_ms = Some(latency_ms);
            }
            ProbeOutcome::Unreachable { error } => {
                self.status = HealthStatus::Unreachable;
                self.error = Some(error);
            }
        }
    }
}

// ─────────────────────────────────────────────
// ProviderInfo
// ─────────────────────────────────────────────

/// A configured provider plus its current health, as shown to the UI.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Serialized masked: the UI learns whether a key is set, never the key.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_masked_key"
    )]
    pub api_key: Option<String>,
    pub models: Vec<ModelEntry>,
    pub health: Health,
}

impl From<ProviderConfig> for ProviderInfo {
    fn from(config: ProviderConfig) -> Self {
        let health = Health::unknown(&config.provider, config.base_url.as_deref());
        ProviderInfo {
            provider: config.provider,
            base_url: config.base_url,
            api_key: config.api_key,
            models: config.models,
            health,
        }
    }
}

impl ProviderInfo {
    fn probe_target(&self) -> Option<String> {
        let base = self.base_url.as_deref().filter(|s| !s.is_empty())?;
        Some(join_url(base, health_path(&self.provider)))
    }
}

fn serialize_masked_key<S: Serializer>(key: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match key.as_deref() {
        Some("") | None => s.serialize_str(""),
        Some(_) => s.serialize_str("********"),
    }
}

/// Path probed for a provider: Ollama lists tags, everything else lists models.
fn health_path(provider: &str) -> &'static str {
    if provider == LOCAL_ENGINE_PROVIDER {
        "tags"
    } else {
        "models"
    }
}

// ─────────────────────────────────────────────
// Probe
// ─────────────────────────────────────────────

/// Classified probe result.
#[derive(Clone, Debug, PartialEq)]
enum ProbeOutcome {
    Reachable { latency_ms: u64 },
    Unreachable { error: String },
}

/// GET `url` once and classify the outcome. Never fails.
async fn probe(client: &reqwest::Client, url: &str, deadline: Duration) -> ProbeOutcome {
    let start = Instant::now();
    match send_with_deadline(client.get(url), deadline).await {
        Ok(response) if response.status().is_success() => {
            let latency_ms = (start.elapsed().as_secs_f64() * 1000.0).round() as u64;
            debug!(url, latency_ms, "probe ok");
            ProbeOutcome::Reachable { latency_ms }
        }
        Ok(response) => {
            let status = response.status().as_u16();
            warn!(url, status, "probe got non-success status");
            ProbeOutcome::Unreachable {
                error: format!("HTTP {}", status),
            }
        }
        Err(SendFailure::Timeout) => {
            warn!(url, deadline_ms = deadline.as_millis() as u64, "probe timed out");
            ProbeOutcome::Unreachable {
                error: "timeout".to_string(),
            }
        }
        Err(SendFailure::Network(e)) => {
            warn!(url, error = %e, "probe failed");
            ProbeOutcome::Unreachable {
                error: e.to_string(),
            }
        }
    }
}

// ─────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────

impl LocalLlmAdapter {
    /// Build the provider list with fresh health for every entry.
    ///
    /// Configured providers come first, in order; the synthetic
    /// `ollama-local` entry is appended when a local engine URL is set.
    pub async fn providers(&self) -> Vec<ProviderInfo> {
        let mut providers: Vec<ProviderInfo> = self
            .configured_providers()
            .into_iter()
            .map(ProviderInfo::from)
            .collect();

        if let Some(base) = self.settings.ollama_base_url() {
            providers.push(ProviderConfig::local_engine(base).into());
        }

        let deadline = self.settings.timeouts.probe();
        let probes = providers.iter().map(|info| async move {
            match info.probe_target() {
                Some(url) => Some(probe(&self.client, &url, deadline).await),
                None => None,
            }
        });
        let outcomes = join_all(probes).await;

        for (info, outcome) in providers.iter_mut().zip(outcomes) {
            if let Some(outcome) = outcome {
                info.health.record(outcome);
            }
        }

        debug!(count = providers.len(), "provider list built");
        providers
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

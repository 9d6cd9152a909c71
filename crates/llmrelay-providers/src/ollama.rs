//! Local Ollama engine pass-throughs: list installed models, delete a model.

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::transport::{is_truthy, join_url, send_buffered};
use crate::LocalLlmAdapter;

impl LocalLlmAdapter {
    fn local_engine_base(&self) -> Result<&str, RelayError> {
        self.settings
            .ollama_base_url()
            .ok_or_else(|| RelayError::Configuration("OLLAMA_BASE_URL not configured".into()))
    }

    /// Fail with `FeatureDisabled` unless model deletion is switched on.
    pub fn ensure_delete_enabled(&self) -> Result<(), RelayError> {
        if self.settings.enable_model_delete {
            Ok(())
        } else {
            Err(RelayError::FeatureDisabled("Model delete disabled".into()))
        }
    }

    /// GET the engine's tag list. Success is `{"tags": <upstream body>}`.
    pub async fn list_local_models(&self) -> Result<Value, RelayError> {
        let base = self.local_engine_base()?;
        let url = join_url(base, "tags");
        debug!(url = %url, "Listing local models");

        let (status, data) =
            send_buffered(self.client.get(&url), self.settings.timeouts.manage()).await?;
        if !status.is_success() {
            return Err(engine_failure(status, data));
        }

        Ok(json!({ "tags": data }))
    }

    /// POST `{model}` to the engine's delete endpoint. Success is
    /// `{"result": <upstream body>}`.
    ///
    /// Checks the feature flag before looking at the body or the network.
    pub async fn delete_local_model(&self, body: &Value) -> Result<Value, RelayError> {
        self.ensure_delete_enabled()?;

        let model = body
            .get("model")
            .filter(|m| is_truthy(m))
            .ok_or_else(|| RelayError::Validation("model required".into()))?;
        let base = self.local_engine_base()?;
        let url = join_url(base, "delete");

        info!(model = %model, "Deleting local model");
        let request = self.client.post(&url).json(&json!({ "model": model }));
        let (status, data) = send_buffered(request, self.settings.timeouts.manage()).await?;
        if !status.is_success() {
            return Err(engine_failure(status, data));
        }

        Ok(json!({ "result": data }))
    }
}

/// Relay an engine failure: its body if it sent one, else the status reason.
fn engine_failure(status: StatusCode, data: Option<Value>) -> RelayError {
    warn!(status = %status, "Local engine returned an error");
    let error = match data {
        Some(d) if is_truthy(&d) => d,
        _ => json!(status.canonical_reason().unwrap_or_default()),
    };
    RelayError::Upstream { status, error }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Config loader: reads `~/.llmrelay/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.llmrelay/config.json`
//! 3. Environment variables (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path), |key| {
        std::env::var(key).ok()
    })
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment overrides on top of a loaded config.
///
/// `lookup` resolves a variable name to its value; `load_config` passes
/// `std::env::var`.
///
/// Supported overrides:
/// - `OPENAI_COMPATIBLE_DATA` → `localLlm.openaiCompatibleData` (JSON string)
/// - `OLLAMA_BASE_URL` → `localLlm.ollamaBaseUrl`
/// - `LOCAL_LLM_ENABLE_PULL` → `localLlm.enableModelDelete` (only `"true"` enables)
/// - `LLMRELAY_GATEWAY__HOST` → `gateway.host`
/// - `LLMRELAY_GATEWAY__PORT` → `gateway.port`
fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("OPENAI_COMPATIBLE_DATA") {
        config.local_llm.openai_compatible_data = Some(serde_json::Value::String(val));
    }
    if let Some(val) = lookup("OLLAMA_BASE_URL") {
        config.local_llm.ollama_base_url = Some(val);
    }
    if let Some(val) = lookup("LOCAL_LLM_ENABLE_PULL") {
        config.local_llm.enable_model_delete = val == "true";
    }

    if let Some(val) = lookup("LLMRELAY_GATEWAY__HOST") {
        config.gateway.host = val;
    }
    if let Some(val) = lookup("LLMRELAY_GATEWAY__PORT") {
        match val.parse::<u16>() {
            Ok(p) => config.gateway.port = p,
            Err(_) => warn!("Ignoring invalid LLMRELAY_GATEWAY__PORT: {}", val),
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Error taxonomy for adapter operations.
//!
//! Every variant maps to an HTTP status and a JSON body of the shape
//! `{"error": ...}`, so callers can relay failures without inspecting them.

use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure of an adapter operation.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed caller input (missing model/messages, missing model name).
    #[error("{0}")]
    Validation(String),

    /// No usable provider or base URL.
    #[error("{0}")]
    Configuration(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, error: Value },

    /// Upstream did not answer before the call's deadline.
    #[error("Upstream timeout")]
    Timeout,

    /// Connection-level failure (DNS, refused, reset, ...).
    #[error("{0}")]
    Transport(String),

    /// Caller has no session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Operation switched off by configuration.
    #[error("{0}")]
    FeatureDisabled(String),
}

impl RelayError {
    /// HTTP status to answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) | RelayError::Configuration(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Timeout | RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
        }
    }

    /// JSON body to answer with.
    pub fn body(&self) -> Value {
        match self {
            RelayError::Upstream { error, .. } => json!({ "error": error }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

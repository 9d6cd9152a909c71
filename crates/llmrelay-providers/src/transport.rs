//! Outbound HTTP plumbing shared by every adapter operation.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

/// Why an outbound call produced no response.
#[derive(Debug)]
pub(crate) enum SendFailure {
    /// The deadline elapsed first; the in-flight request was dropped.
    Timeout,
    /// Anything else reqwest reports.
    Network(reqwest::Error),
}

impl From<reqwest::Error> for SendFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SendFailure::Timeout
        } else {
            SendFailure::Network(e)
        }
    }
}

impl From<SendFailure> for crate::RelayError {
    fn from(failure: SendFailure) -> Self {
        match failure {
            SendFailure::Timeout => crate::RelayError::Timeout,
            SendFailure::Network(e) => crate::RelayError::Transport(e.to_string()),
        }
    }
}

/// Join a base URL and a path suffix, stripping one trailing slash from the base.
pub(crate) fn join_url(base: &str, suffix: &str) -> String {
    if base.is_empty() {
        return suffix.to_string();
    }
    let trimmed = base.strip_suffix('/').unwrap_or(base);
    format!("{}/{}", trimmed, suffix)
}

/// Send a request, giving up once `deadline` elapses before response headers arrive.
pub(crate) async fn send_with_deadline(
    request: RequestBuilder,
    deadline: Duration,
) -> Result<Response, SendFailure> {
    match tokio::time::timeout(deadline, request.send()).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SendFailure::Timeout),
    }
}

/// Send a request and read the whole body, all within `deadline`.
///
/// The body is parsed as JSON when possible; unreadable or non-JSON bodies
/// come back as `None`.
pub(crate) async fn send_buffered(
    request: RequestBuilder,
    deadline: Duration,
) -> Result<(StatusCode, Option<Value>), SendFailure> {
    let exchange = async {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await.ok();
        Ok::<_, SendFailure>((status, body))
    };

    match tokio::time::timeout(deadline, exchange).await {
        Ok(result) => {
            let (status, body) = result?;
            let json = body.and_then(|b| serde_json::from_slice::<Value>(&b).ok());
            Ok((status, json))
        }
        Err(_) => Err(SendFailure::Timeout),
    }
}

/// JavaScript-style truthiness, used where the wire contract says "present and truthy".
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

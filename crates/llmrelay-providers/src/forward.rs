//! Chat forwarding to an OpenAI-compatible `/chat/completions` endpoint.
//!
//! Two flavours share validation and provider resolution:
//! - [`LocalLlmAdapter::forward_chat`] buffers the upstream JSON,
//! - [`LocalLlmAdapter::stream_chat`] hands back the live upstream body so
//!   the caller can relay bytes (usually SSE) without re-encoding them.

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use llmrelay_core::utils::truncate_string;

use crate::catalog::{resolve_provider, ProviderConfig};
use crate::error::RelayError;
use crate::transport::{is_truthy, join_url, send_buffered, send_with_deadline};
use crate::LocalLlmAdapter;

/// Content type relayed when the upstream does not name one.
pub const DEFAULT_STREAM_CONTENT_TYPE: &str = "application/octet-stream";

// ─────────────────────────────────────────────
// ChatRequest
// ─────────────────────────────────────────────

/// A validated inbound chat request.
///
/// `model` and `messages` are opaque JSON and are forwarded as received.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: Value,
    pub messages: Vec<Value>,
    pub provider: Option<String>,
}

impl ChatRequest {
    /// Validate a raw request body: `model` must be truthy and `messages` an array.
    pub fn from_body(body: &Value) -> Result<Self, RelayError> {
        let model = body.get("model").filter(|m| is_truthy(m));
        let messages = body.get("messages").and_then(Value::as_array);

        match (model, messages) {
            (Some(model), Some(messages)) => Ok(ChatRequest {
                model: model.clone(),
                messages: messages.clone(),
                provider: body.get("provider").and_then(Value::as_str).map(String::from),
            }),
            _ => Err(RelayError::Validation("model and messages required".into())),
        }
    }

    fn payload(&self, stream: bool) -> Value {
        let mut payload = json!({
            "model": self.model,
            "messages": self.messages,
        });
        if stream {
            payload["stream"] = json!(true);
        }
        payload
    }
}

// ─────────────────────────────────────────────
// UpstreamStream
// ─────────────────────────────────────────────

/// A successful streaming upstream response, not yet consumed.
///
/// Callers answer with status 200, the [`content_type`](Self::content_type),
/// and the bytes from [`into_byte_stream`](Self::into_byte_stream).
pub struct UpstreamStream {
    content_type: String,
    response: reqwest::Response,
}

impl std::fmt::Debug for UpstreamStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamStream")
            .field("content_type", &self.content_type)
            .field("upstream_status", &self.response.status())
            .finish()
    }
}

impl UpstreamStream {
    fn new(response: reqwest::Response) -> Self {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_STREAM_CONTENT_TYPE)
            .to_string();
        UpstreamStream {
            content_type,
            response,
        }
    }

    /// Upstream `Content-Type`, verbatim.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The upstream body as raw chunks, unparsed.
    pub fn into_byte_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static {
        self.response.bytes_stream()
    }
}

// ─────────────────────────────────────────────
// Forwarding
// ─────────────────────────────────────────────

impl LocalLlmAdapter {
    /// Resolve the target provider and its base URL for a request.
    fn chat_target(&self, request: &ChatRequest) -> Result<(ProviderConfig, String), RelayError> {
        let providers = self.configured_providers();
        let target = resolve_provider(&providers, request.provider.as_deref())
            .filter(|p| p.base_url().is_some())
            .ok_or_else(|| RelayError::Configuration("No provider baseUrl configured".into()))?;

        let base = target.base_url().unwrap_or_default().to_string();
        Ok((target.clone(), base))
    }

    fn completions_request(&self, target: &ProviderConfig, base: &str, payload: &Value) -> RequestBuilder {
        let mut request = self
            .client
            .post(join_url(base, "chat/completions"))
            .json(payload);
        if let Some(key) = target.bearer_token() {
            request = request.bearer_auth(key);
        }
        request
    }

    /// Forward a chat request and buffer the upstream JSON.
    ///
    /// Returns the upstream body as-is on success (`null` if it wasn't JSON).
    pub async fn forward_chat(&self, body: &Value) -> Result<Value, RelayError> {
        let request = ChatRequest::from_body(body)?;
        let (target, base) = self.chat_target(&request)?;

        debug!(
            provider = %target.provider,
            model = %request.model,
            messages = request.messages.len(),
            "Forwarding chat request"
        );

        let outbound = self.completions_request(&target, &base, &request.payload(false));
        let (status, data) = send_buffered(outbound, self.settings.timeouts.chat())
            .await
            .map_err(|failure| {
                let err = RelayError::from(failure);
                error!(provider = %target.provider, error = %err, "Chat forward failed");
                err
            })?;

        if !status.is_success() {
            let error = match data {
                Some(d) if is_truthy(&d["error"]) => d["error"].clone(),
                Some(d) if is_truthy(&d) => d,
                _ => json!(format!("Upstream {}", status.as_u16())),
            };
            warn!(provider = %target.provider, status = %status, "Upstream rejected chat request");
            return Err(RelayError::Upstream { status, error });
        }

        Ok(data.unwrap_or(Value::Null))
    }

    /// Forward a chat request with `stream: true` and return the live body.
    ///
    /// Only the wait for response headers is bounded; the body streams for as
    /// long as the upstream keeps it open.
    pub async fn stream_chat(&self, body: &Value) -> Result<UpstreamStream, RelayError> {
        let request = ChatRequest::from_body(body)?;
        let (target, base) = self.chat_target(&request)?;

        debug!(
            provider = %target.provider,
            model = %request.model,
            messages = request.messages.len(),
            "Opening chat stream"
        );

        let outbound = self.completions_request(&target, &base, &request.payload(true));
        let response = send_with_deadline(outbound, self.settings.timeouts.stream())
            .await
            .map_err(|failure| {
                let err = RelayError::from(failure);
                error!(provider = %target.provider, error = %err, "Chat stream failed to open");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                provider = %target.provider,
                status = %status,
                body = %truncate_string(&text, 200),
                "Upstream rejected chat stream"
            );
            let error = if text.is_empty() {
                format!("Upstream {}", status.as_u16())
            } else {
                text
            };
            return Err(RelayError::Upstream {
                status,
                error: Value::String(error),
            });
        }

        Ok(UpstreamStream::new(response))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use llmrelay_core::config::AdapterSettings;
    use reqwest::StatusCode;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn adapter_for(providers: Value) -> LocalLlmAdapter {
        LocalLlmAdapter::new(AdapterSettings {
            openai_compatible_data: Some(providers),
            ..Default::default()
        })
    }

    fn chat_body() -> Value {
        json!({
            "model": "llama3",
            "messages": [{"role": "user", "content": "Hello"}]
        })
    }

    // ── Validation & resolution ──

    #[test]
    fn test_request_requires_messages() {
        let err = ChatRequest::from_body(&json!({"model": "llama3"})).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body()["error"], "model and messages required");
    }

    #[test]
    fn test_request_requires_truthy_model() {
        for body in [
            json!({"messages": []}),
            json!({"model": "", "messages": []}),
            json!({"model": null, "messages": []}),
            json!({"model": "m", "messages": "hi"}),
            json!("not an object"),
        ] {
            assert!(ChatRequest::from_body(&body).is_err(), "accepted {body}");
        }
    }

    #[test]
    fn test_request_keeps_provider_name() {
        let req = ChatRequest::from_body(&json!({
            "model": "m", "messages": [], "provider": "vllm"
        }))
        .unwrap();
        assert_eq!(req.provider.as_deref(), Some("vllm"));
        assert!(req.messages.is_empty());
    }

    #[tokio::test]
    async fn test_missing_messages_short_circuits() {
        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": "http://127.0.0.1:1", "models": []}]));
        let err = adapter.forward_chat(&json!({"model": "m"})).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_no_providers_is_configuration_error() {
        let adapter = LocalLlmAdapter::new(AdapterSettings::default());
        let err = adapter.forward_chat(&chat_body()).await.unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
        assert_eq!(err.body()["error"], "No provider baseUrl configured");
    }

    #[tokio::test]
    async fn test_resolved_provider_without_base_url() {
        let adapter = adapter_for(json!([
            {"provider": "nourl", "models": []},
            {"provider": "withurl", "baseUrl": "http://127.0.0.1:1", "models": []}
        ]));
        let err = adapter.forward_chat(&chat_body()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    // ── Buffered forwarding ──

    #[tokio::test]
    async fn test_forward_success_returns_upstream_json() {
        let mock_server = MockServer::start().await;
        let completion = json!({
            "id": "chatcmpl-1",
            "choices": [{"message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-local"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(chat_body()))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{
            "provider": "lmstudio",
            "baseUrl": format!("{}/v1/", mock_server.uri()),
            "apiKey": "sk-local",
            "models": []
        }]));

        let data = adapter.forward_chat(&chat_body()).await.unwrap();
        assert_eq!(data, completion);
    }

    #[tokio::test]
    async fn test_forward_without_key_sends_no_auth_header() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("authorization") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
                }
            })
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{
            "provider": "open", "baseUrl": mock_server.uri(), "apiKey": "", "models": []
        }]));

        let data = adapter.forward_chat(&chat_body()).await.unwrap();
        assert_eq!(data, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_unknown_provider_falls_back_to_first() {
        let first = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "first"})))
            .expect(1)
            .mount(&first)
            .await;

        let second = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&second)
            .await;

        let adapter = adapter_for(json!([
            {"provider": "first", "baseUrl": first.uri(), "models": []},
            {"provider": "second", "baseUrl": second.uri(), "models": []}
        ]));

        let mut body = chat_body();
        body["provider"] = json!("missing");
        let data = adapter.forward_chat(&body).await.unwrap();
        assert_eq!(data["from"], "first");
    }

    #[tokio::test]
    async fn test_named_provider_is_selected() {
        let first = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&first)
            .await;

        let second = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "second"})))
            .expect(1)
            .mount(&second)
            .await;

        let adapter = adapter_for(json!([
            {"provider": "first", "baseUrl": first.uri(), "models": []},
            {"provider": "second", "baseUrl": second.uri(), "models": []}
        ]));

        let mut body = chat_body();
        body["provider"] = json!("second");
        let data = adapter.forward_chat(&body).await.unwrap();
        assert_eq!(data["from"], "second");
    }

    #[tokio::test]
    async fn test_upstream_error_field_is_extracted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}
            })))
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": mock_server.uri(), "models": []}]));
        let err = adapter.forward_chat(&chat_body()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.body()["error"]["message"], "Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_upstream_error_without_error_field_relays_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "bad model"})))
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": mock_server.uri(), "models": []}]));
        let err = adapter.forward_chat(&chat_body()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), json!({"error": {"detail": "bad model"}}));
    }

    #[tokio::test]
    async fn test_upstream_error_non_json_uses_status_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": mock_server.uri(), "models": []}]));
        let err = adapter.forward_chat(&chat_body()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), json!({"error": "Upstream 500"}));
    }

    #[tokio::test]
    async fn test_forward_network_error_is_bad_gateway() {
        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": "http://127.0.0.1:1", "models": []}]));
        let err = adapter.forward_chat(&chat_body()).await.unwrap_err();

        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_ne!(err.body()["error"], "Upstream timeout");
    }

    #[tokio::test]
    async fn test_forward_deadline_is_upstream_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
            .mount(&mock_server)
            .await;

        let mut settings = AdapterSettings {
            openai_compatible_data: Some(json!([
                {"provider": "p", "baseUrl": mock_server.uri(), "models": []}
            ])),
            ..Default::default()
        };
        settings.timeouts.chat_ms = 100;

        let err = LocalLlmAdapter::new(settings)
            .forward_chat(&chat_body())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Timeout));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.body(), json!({"error": "Upstream timeout"}));
    }

    // ── Streaming ──

    #[tokio::test]
    async fn test_stream_relays_bytes_and_content_type() {
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "llama3", "stream": true})))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{
            "provider": "p", "baseUrl": mock_server.uri(), "apiKey": "k", "models": []
        }]));

        let upstream = adapter.stream_chat(&chat_body()).await.unwrap();
        assert_eq!(upstream.content_type(), "text/event-stream");

        let mut stream = Box::pin(upstream.into_byte_stream());
        let mut received = Vec::new();
        while let Some(chunk) = stream.next().await {
            received.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(String::from_utf8(received).unwrap(), sse);
    }

    #[tokio::test]
    async fn test_stream_default_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": mock_server.uri(), "models": []}]));
        let upstream = adapter.stream_chat(&chat_body()).await.unwrap();
        assert_eq!(upstream.content_type(), DEFAULT_STREAM_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_stream_failure_surfaces_upstream_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": mock_server.uri(), "models": []}]));
        let err = adapter.stream_chat(&chat_body()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.body(), json!({"error": "model not found"}));
    }

    #[tokio::test]
    async fn test_stream_failure_empty_body_uses_status_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": mock_server.uri(), "models": []}]));
        let err = adapter.stream_chat(&chat_body()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body(), json!({"error": "Upstream 503"}));
    }

    #[tokio::test]
    async fn test_stream_network_error_is_bad_gateway() {
        let adapter = adapter_for(json!([{"provider": "p", "baseUrl": "http://127.0.0.1:1", "models": []}]));
        let err = adapter.stream_chat(&chat_body()).await.unwrap_err();

        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_ne!(err.body()["error"], "Upstream timeout");
    }

    #[tokio::test]
    async fn test_stream_deadline_is_upstream_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: [DONE]\n\n", "text/event-stream")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let mut settings = AdapterSettings {
            openai_compatible_data: Some(json!([
                {"provider": "p", "baseUrl": mock_server.uri(), "models": []}
            ])),
            ..Default::default()
        };
        settings.timeouts.stream_ms = 50;

        let err = LocalLlmAdapter::new(settings)
            .stream_chat(&chat_body())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Timeout));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.body(), json!({"error": "Upstream timeout"}));
    }

    #[tokio::test]
    async fn test_stream_validation_matches_buffered() {
        let adapter = LocalLlmAdapter::new(AdapterSettings::default());
        let err = adapter.stream_chat(&json!({"messages": []})).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

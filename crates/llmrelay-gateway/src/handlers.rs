//! Route handlers: thin glue between HTTP and [`LocalLlmAdapter`].
//!
//! [`LocalLlmAdapter`]: llmrelay_providers::LocalLlmAdapter

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use llmrelay_providers::RelayError;

use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::state::AppState;

/// Unwrap a JSON body, turning extractor rejections into a 400.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Require a session, or fail with 401.
async fn require_session(state: &AppState, headers: &HeaderMap) -> ApiResult<Session> {
    let session = state
        .sessions
        .verify(headers)
        .await
        .ok_or(RelayError::Unauthorized)?;
    debug!(user = %session.user_id, "session verified");
    Ok(session)
}

/// `GET /health`: gateway liveness.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/local-llm/providers`: configured providers with fresh health.
pub async fn list_providers(State(state): State<AppState>) -> Json<Value> {
    let providers = state.adapter.providers().await;
    Json(json!({ "providers": providers }))
}

/// `POST /api/local-llm/proxy`: buffered chat forward.
pub async fn proxy_chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let body = json_body(payload)?;
    let data = state.adapter.forward_chat(&body).await?;
    Ok(Json(data))
}

/// `POST /api/local-llm/stream`: streamed chat forward; requires a session.
///
/// Upstream bytes are relayed as they arrive, under the upstream content type.
pub async fn stream_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    require_session(&state, &headers).await?;
    let body = json_body(payload)?;

    let upstream = state.adapter.stream_chat(&body).await?;
    let content_type = upstream.content_type().to_string();
    let body = Body::from_stream(upstream.into_byte_stream());

    Ok(([(CONTENT_TYPE, content_type)], body).into_response())
}

/// `GET /api/local-llm/ollama/list`: local engine tags; requires a session.
pub async fn list_local_models(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    require_session(&state, &headers).await?;
    let tags = state.adapter.list_local_models().await?;
    Ok(Json(tags))
}

/// `POST /api/local-llm/ollama/delete`: delete a local model.
///
/// The feature flag is checked before the session, so a disabled gateway
/// answers 403 to everyone.
pub async fn delete_local_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    state.adapter.ensure_delete_enabled()?;
    require_session(&state, &headers).await?;
    let body = json_body(payload)?;

    let result = state.adapter.delete_local_model(&body).await?;
    Ok(Json(result))
}

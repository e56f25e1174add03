//! `POST /api/chat`: chat completion relay for the dialogue trainer.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::http::validation::{optional_text, parse_object, ValidationError};
use crate::security::{Decision, QuotaDecision, SessionId};

/// Relay a chat completion payload. `sessionId` is consumed here and never
/// forwarded.
pub async fn relay_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request_id = headers.request_id();

    let mut payload = parse_object(&body)?;
    let session_id = optional_text(&payload, "sessionId")?.map(str::to_string);
    payload.remove("sessionId");

    match payload.get("messages") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("messages").into()),
        Some(Value::Array(items)) if !items.is_empty() => {}
        Some(_) => {
            return Err(ValidationError::invalid("messages", "expected a non-empty array").into())
        }
    }

    let session = SessionId::resolve(session_id.as_deref());

    if let Decision::Rejected { retry_after_secs } = state.chat_limiter.check_and_increment(&session).await {
        return Err(ApiError::RateLimitExceeded { retry_after_secs });
    }

    let used = match state.chat_quota.consume(&session).await {
        QuotaDecision::Within { used } => used,
        QuotaDecision::Exhausted => return Err(ApiError::QuotaExhausted),
    };

    tracing::debug!(request_id = %request_id, session = %session, used, "Relaying chat completion");

    let reply = state
        .upstream
        .relay_chat(&Value::Object(payload))
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Chat upstream call failed");
            ApiError::from(e)
        })?;

    Ok(Json(reply))
}

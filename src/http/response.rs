//! Error responses.
//!
//! # Responsibilities
//! - Map every failure to a status code and a JSON body
//! - Keep upstream diagnostics for upstream status errors only
//! - Never leak transport or parsing internals to the client
//!
//! # Status mapping
//! ```text
//! Validation          → 400 { error, field?, wordCount? }
//! RateLimitExceeded   → 429 { error, retryAfter } + Retry-After
//! QuotaExhausted      → 429 { error, limitReached: true }
//! UpstreamTimeout     → 504 { error, details }
//! RequestTimeout      → 504 { error }
//! Upstream            → upstream status { error, details: <upstream body> }
//! MalformedResponse   → 500
//! Configuration       → 500
//! UpstreamUnavailable → 502
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::http::validation::ValidationError;
use crate::upstream::UpstreamError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("session message limit reached")]
    QuotaExhausted,

    #[error("upstream timed out")]
    UpstreamTimeout,

    #[error("request exceeded {0:?}")]
    RequestTimeout(std::time::Duration),

    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, body: Value },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("configuration error: {0}")]
    Configuration(&'static str),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotConfigured => ApiError::Configuration("OpenAI API key not configured"),
            UpstreamError::Timeout(_) => ApiError::UpstreamTimeout,
            UpstreamError::Status { status, body } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                body,
            },
            UpstreamError::Malformed(reason) => ApiError::MalformedResponse(reason),
            UpstreamError::Transport(reason) => ApiError::UpstreamUnavailable(reason),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimitExceeded { .. } | ApiError::QuotaExhausted => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UpstreamTimeout | ApiError::RequestTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream { status, .. } => *status,
            ApiError::MalformedResponse(_) | ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Client-facing JSON body.
    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation(err) => {
                let mut body = json!({ "error": err.to_string() });
                if let Some(field) = err.field() {
                    body["field"] = json!(field);
                }
                if let ValidationError::TooShort { word_count, minimum } = err {
                    body["wordCount"] = json!(word_count);
                    body["minWords"] = json!(minimum);
                }
                body
            }
            ApiError::RateLimitExceeded { retry_after_secs } => json!({
                "error": "Zu viele Anfragen. Bitte warte einen Moment.",
                "retryAfter": retry_after_secs,
            }),
            ApiError::QuotaExhausted => json!({
                "error": "Nachrichtenlimit für diese Sitzung erreicht.",
                "limitReached": true,
            }),
            ApiError::UpstreamTimeout => json!({
                "error": "OpenAI request timeout",
                "details": "The request took too long. Please try again.",
            }),
            ApiError::RequestTimeout(_) => json!({ "error": "Request timeout" }),
            ApiError::Upstream { body, .. } => json!({
                "error": "OpenAI API error",
                "details": body,
            }),
            ApiError::MalformedResponse(_) => json!({
                "error": "OpenAI returned an unreadable response",
            }),
            ApiError::Configuration(message) => json!({ "error": message }),
            ApiError::UpstreamUnavailable(_) => json!({
                "error": "OpenAI is unreachable",
            }),
            ApiError::MethodNotAllowed => json!({ "error": "Method not allowed" }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let mut response = (status, Json(self.body())).into_response();
        if let ApiError::RateLimitExceeded { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

//! Upstream wire types and error definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while calling the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No API credential configured.
    #[error("upstream API key not configured")]
    NotConfigured,

    /// No response within the deadline.
    #[error("upstream timeout after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status { status: u16, body: Value },

    /// Upstream answered 2xx but the payload was not what we asked for.
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Connection, TLS or body transfer failure.
    #[error("upstream transport error: {0}")]
    Transport(String),
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// `response_format` of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    pub const JSON_OBJECT: Self = Self { kind: "json_object" };
}

/// Body of `POST chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Body of `POST audio/speech`.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
    pub speed: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

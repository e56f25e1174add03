//! OpenAI HTTP client with a hard deadline and error translation.
//!
//! # Responsibilities
//! - Issue one POST per call, authenticated with the configured key
//! - Bound the whole exchange (connect, status, body) by a deadline
//! - Translate failures into [`UpstreamError`]
//! - Decode JSON embedded in chat completion messages

use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::upstream::types::{
    ChatCompletion, ChatCompletionRequest, SpeechRequest, UpstreamError, UpstreamResult,
};

pub const CHAT_COMPLETIONS: &str = "chat/completions";
pub const AUDIO_SPEECH: &str = "audio/speech";

/// Client for the upstream completion and speech API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `payload` to `<base_url>/<path>` under `timeout`.
    ///
    /// Returns the raw 2xx body. Non-2xx statuses become
    /// [`UpstreamError::Status`] with the upstream body attached.
    pub async fn call<P>(&self, path: &str, payload: &P, timeout: Duration) -> UpstreamResult<Bytes>
    where
        P: Serialize + ?Sized,
    {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)?;
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| UpstreamError::NotConfigured)?;
        auth.set_sensitive(true);

        let url = format!("{}/{}", self.base_url, path);
        let start = Instant::now();

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .header(AUTHORIZATION, auth)
                .json(payload)
                .send()
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;

            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;

            if !status.is_success() {
                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                    body: error_body(&body),
                });
            }
            Ok(body)
        };

        let result = match with_deadline(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(timeout)),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(UpstreamError::Timeout(_)) => "timeout",
            Err(UpstreamError::Status { .. }) => "status",
            Err(_) => "error",
        };
        metrics::record_upstream(path, outcome, start);
        tracing::debug!(
            path,
            outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upstream call finished"
        );

        result
    }

    /// Run a chat completion and return the upstream JSON untouched.
    pub async fn relay_chat(&self, payload: &Value) -> UpstreamResult<Value> {
        let body = self.call(CHAT_COMPLETIONS, payload, self.timeout).await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    /// Run a chat completion that was asked for a JSON object and decode that
    /// object into `T`.
    pub async fn complete_json<T>(&self, request: &ChatCompletionRequest) -> UpstreamResult<T>
    where
        T: DeserializeOwned,
    {
        let body = self.call(CHAT_COMPLETIONS, request, self.timeout).await?;
        decode_completion(&body)
    }

    /// Synthesize speech and return the encoded audio.
    pub async fn speech(&self, request: &SpeechRequest) -> UpstreamResult<Bytes> {
        self.call(AUDIO_SPEECH, request, self.timeout).await
    }
}

/// Keep the upstream error body as JSON when possible, as text otherwise.
fn error_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

/// Decode `choices[0].message.content` as JSON into `T`.
pub(crate) fn decode_completion<T: DeserializeOwned>(raw: &[u8]) -> UpstreamResult<T> {
    let completion: ChatCompletion = serde_json::from_slice(raw)
        .map_err(|e| UpstreamError::Malformed(format!("completion envelope: {}", e)))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| UpstreamError::Malformed("completion has no message content".into()))?;

    serde_json::from_str(&content)
        .map_err(|e| UpstreamError::Malformed(format!("message content: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        ok: bool,
    }

    fn envelope(content: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_completion() {
        let raw = envelope(json!("{\"ok\": true}"));
        assert_eq!(decode_completion::<Verdict>(&raw).unwrap(), Verdict { ok: true });
    }

    #[test]
    fn test_decode_rejects_non_json_content() {
        let raw = envelope(json!("Sorry, I cannot help with that."));
        assert!(matches!(
            decode_completion::<Verdict>(&raw),
            Err(UpstreamError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_shape_and_empty_choices() {
        let raw = envelope(json!("{\"something\": 1}"));
        assert!(decode_completion::<Verdict>(&raw).is_err());

        let raw = serde_json::to_vec(&json!({ "choices": [] })).unwrap();
        assert!(decode_completion::<Verdict>(&raw).is_err());

        let raw = envelope(Value::Null);
        assert!(decode_completion::<Verdict>(&raw).is_err());

        assert!(decode_completion::<Verdict>(b"<html>").is_err());
    }

    #[test]
    fn test_error_body_keeps_json_or_text() {
        assert_eq!(
            error_body(br#"{"error":{"message":"bad key"}}"#),
            json!({ "error": { "message": "bad key" } })
        );
        assert_eq!(error_body(b"Bad Gateway"), json!("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let config = UpstreamConfig {
            base_url: "http://127.0.0.1:1".into(),
            api_key: None,
            timeout_ms: 1000,
        };
        let client = UpstreamClient::new(&config).unwrap();
        assert!(!client.has_credentials());
        let err = client.relay_chat(&json!({})).await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured));
    }
}

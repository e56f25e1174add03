//! Upstash Redis REST counter store.
//!
//! `increment` runs `SET key 0 EX ttl NX` and `INCR key` inside one
//! `/multi-exec` transaction, so the key is created with its expiry already
//! attached.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use crate::config::RateLimitConfig;
use crate::store::{ttl_secs, CounterStore, StoreError, StoreResult};

/// Counter store backed by the Upstash REST API.
#[derive(Clone)]
pub struct UpstashStore {
    client: reqwest::Client,
    base_url: String,
}

impl UpstashStore {
    /// Create a store for `base_url` authenticated with `token`.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> StoreResult<Self> {
        url::Url::parse(base_url)
            .map_err(|e| StoreError::Misconfigured(format!("invalid Upstash URL '{}': {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| StoreError::Misconfigured("Upstash token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Misconfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> StoreResult<Self> {
        let (Some(url), Some(token)) = (config.upstash_url.as_deref(), config.upstash_token.as_deref()) else {
            return Err(StoreError::Misconfigured(
                "UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN are required".into(),
            ));
        };
        Self::new(url, token, Duration::from_millis(config.store_timeout_ms))
    }

    async fn post(&self, path: &str, body: Value) -> StoreResult<Value> {
        let url = if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))
    }
}

/// Pull the INCR result out of a `/multi-exec` reply.
fn parse_transaction_count(reply: &Value) -> StoreResult<u64> {
    if let Some(err) = reply.get("error").and_then(Value::as_str) {
        return Err(StoreError::Protocol(err.to_string()));
    }

    let results = reply
        .as_array()
        .ok_or_else(|| StoreError::Protocol(format!("expected array, got {}", reply)))?;

    for item in results {
        if let Some(err) = item.get("error").and_then(Value::as_str) {
            return Err(StoreError::Protocol(err.to_string()));
        }
    }

    let incr = results
        .last()
        .and_then(|item| item.get("result"))
        .ok_or_else(|| StoreError::Protocol("missing INCR result".into()))?;

    count_from(incr)
}

/// Upstash may encode integers as numbers or strings.
fn count_from(value: &Value) -> StoreResult<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| StoreError::Protocol(format!("non-integer counter value {}", value)))
}

#[async_trait]
impl CounterStore for UpstashStore {
    async fn increment(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let ttl = ttl_secs(ttl).to_string();
        let reply = self
            .post(
                "multi-exec",
                json!([["SET", key, "0", "EX", ttl, "NX"], ["INCR", key]]),
            )
            .await?;
        parse_transaction_count(&reply)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let reply = self
            .post("", json!(["EXPIRE", key, ttl_secs(ttl).to_string()]))
            .await?;
        if let Some(err) = reply.get("error").and_then(Value::as_str) {
            return Err(StoreError::Protocol(err.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "upstash"
    }
}

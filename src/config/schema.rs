//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limit, CORS).
    pub listener: ListenerConfig,

    /// OpenAI upstream settings.
    pub upstream: UpstreamConfig,

    /// Per-session rate limiting and the counter store behind it.
    pub rate_limit: RateLimitConfig,

    /// Chat relay message quota.
    pub chat: ChatConfig,

    /// Letter correction settings.
    pub schreiben: SchreibenConfig,

    /// Text-to-speech settings.
    pub speech: SpeechConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            max_body_bytes: 1024 * 1024,
            allowed_origins: Vec::new(),
        }
    }
}

/// OpenAI upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API base URL, without trailing path segments for the endpoints.
    pub base_url: String,

    /// Bearer credential. Usually supplied through `OPENAI_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Hard deadline for one upstream exchange, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_ms: 30_000,
        }
    }
}

/// Which counter store backs the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Upstash when credentials are present, otherwise no limiting.
    #[default]
    Auto,
    Upstash,
    Memory,
    Disabled,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Counter store selection.
    pub store: StoreKind,

    /// Length of the fixed window in seconds. One request per session passes
    /// per window.
    pub window_secs: u64,

    /// Upstash REST endpoint (`UPSTASH_REDIS_REST_URL`).
    pub upstash_url: Option<String>,

    /// Upstash REST token (`UPSTASH_REDIS_REST_TOKEN`).
    #[serde(skip_serializing)]
    pub upstash_token: Option<String>,

    /// Deadline for a single counter store call, in milliseconds.
    pub store_timeout_ms: u64,

    /// How often the in-memory store drops expired counters.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Auto,
            window_secs: 2,
            upstash_url: None,
            upstash_token: None,
            store_timeout_ms: 1500,
            sweep_interval_secs: 300,
        }
    }
}

impl RateLimitConfig {
    /// True when both Upstash settings are present and non-empty.
    pub fn has_upstash(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.upstash_url) && present(&self.upstash_token)
    }
}

/// Chat relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages allowed per session lifetime.
    pub message_limit: u64,

    /// Session lifetime in seconds; the message counter expires after it.
    pub session_ttl_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_limit: 30,
            session_ttl_secs: 20 * 60,
        }
    }
}

/// Letter correction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchreibenConfig {
    /// Minimum word count before a letter is sent for correction.
    pub min_words: usize,

    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SchreibenConfig {
    fn default() -> Self {
        Self {
            min_words: 50,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 3000,
        }
    }
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub model: String,
    pub default_voice: String,
    /// Playback speed; slightly below 1.0 for learners.
    pub speed: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            default_voice: "nova".to_string(),
            speed: 0.95,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outer deadline for a whole inbound request in seconds. Should exceed
    /// the upstream deadline so upstream timeouts surface as 504.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

//! Upstream (OpenAI) integration.
//!
//! # Data Flow
//! ```text
//! handler
//!     → client.rs (build POST, bearer auth)
//!     → resilience::with_deadline (hard timeout)
//!     → status check → UpstreamError::Status with upstream body
//!     → decode (chat JSON, embedded JSON object, or audio bytes)
//! ```

pub mod client;
pub mod types;

pub use client::UpstreamClient;
pub use types::{
    ChatCompletionRequest, ChatMessage, ResponseFormat, SpeechRequest, UpstreamError, UpstreamResult,
};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay OPENAI_* / UPSTASH_* / PORT env)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets come from the environment and are never serialized back out

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ChatConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RateLimitConfig,
    SchreibenConfig, SpeechConfig, StoreKind, TimeoutConfig, UpstreamConfig,
};

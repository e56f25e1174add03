//! Counter stores backing the rate limiter and chat quota.
//!
//! # Data Flow
//! ```text
//! RateLimiter / MessageQuota
//!     → CounterStore::increment(key, ttl)   (atomic, TTL set on creation)
//!         → memory.rs  (DashMap, single process)
//!         → upstash.rs (Upstash Redis REST, shared across instances)
//! ```
//!
//! # Design Decisions
//! - Stores are injected as `Arc<dyn CounterStore>`, never global
//! - Increment and TTL are one atomic step so a key can never outlive its window
//! - Callers decide what a store failure means (the limiter fails open)

pub mod memory;
pub mod upstash;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{RateLimitConfig, StoreKind};

pub use memory::MemoryStore;
pub use upstash::UpstashStore;

/// Errors from a counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store could not be reached or the call timed out.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// Store answered with a non-success HTTP status.
    #[error("store returned status {0}")]
    Status(u16),

    /// Store answered with something other than the expected shape.
    #[error("unexpected store response: {0}")]
    Protocol(String),

    /// Store settings are unusable.
    #[error("store misconfigured: {0}")]
    Misconfigured(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A key-value store that can count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment `key` and return the new count. A key created by
    /// this call expires after `ttl`; an existing key keeps its expiry.
    async fn increment(&self, key: &str, ttl: Duration) -> StoreResult<u64>;

    /// Reset the expiry of `key` to `ttl` from now.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()>;

    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Build the configured store. `Ok(None)` means limiting is disabled.
pub fn from_config(config: &RateLimitConfig) -> StoreResult<Option<Arc<dyn CounterStore>>> {
    let store: Option<Arc<dyn CounterStore>> = match config.store {
        StoreKind::Disabled => None,
        StoreKind::Memory => Some(Arc::new(MemoryStore::new())),
        StoreKind::Upstash => Some(Arc::new(UpstashStore::from_config(config)?)),
        StoreKind::Auto if config.has_upstash() => Some(Arc::new(UpstashStore::from_config(config)?)),
        StoreKind::Auto => None,
    };
    Ok(store)
}

/// Whole seconds for a TTL, never below one.
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

//! Per-session fixed-window rate limiting and chat message quotas.
//!
//! Both guards sit on a shared [`CounterStore`]. The first increment of a key
//! opens its window; any further increment before the key expires is a
//! rejection. When the store fails the guards let the request through.

use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;
use crate::security::session::SessionId;
use crate::store::CounterStore;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allowed,
    /// The window for this session is still open.
    Rejected { retry_after_secs: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// One request per session per window.
#[derive(Clone)]
pub struct RateLimiter {
    store: Option<Arc<dyn CounterStore>>,
    namespace: &'static str,
    window: Duration,
}

impl RateLimiter {
    /// `store = None` disables limiting.
    pub fn new(store: Option<Arc<dyn CounterStore>>, namespace: &'static str, window: Duration) -> Self {
        Self {
            store,
            namespace,
            window,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn key(&self, session: &SessionId) -> String {
        format!("{}:rate:{}", self.namespace, session)
    }

    fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    /// Count this request against the session's window.
    pub async fn check_and_increment(&self, session: &SessionId) -> Decision {
        let Some(store) = &self.store else {
            return Decision::Allowed;
        };

        let key = self.key(session);
        match store.increment(&key, self.window).await {
            Ok(1) => Decision::Allowed,
            Ok(count) => {
                tracing::warn!(
                    session = %session,
                    namespace = self.namespace,
                    count,
                    "Rate limit exceeded"
                );
                metrics::record_rate_limited(self.namespace, "window");
                Decision::Rejected {
                    retry_after_secs: self.retry_after_secs(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    store = store.name(),
                    namespace = self.namespace,
                    error = %e,
                    "Counter store failed, allowing request"
                );
                metrics::record_store_failure("rate_increment");
                Decision::Allowed
            }
        }
    }
}

/// Outcome of a message quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Within { used: u64 },
    Exhausted,
}

/// Caps messages per session over a session lifetime.
#[derive(Clone)]
pub struct MessageQuota {
    store: Option<Arc<dyn CounterStore>>,
    namespace: &'static str,
    limit: u64,
    lifetime: Duration,
}

impl MessageQuota {
    pub fn new(
        store: Option<Arc<dyn CounterStore>>,
        namespace: &'static str,
        limit: u64,
        lifetime: Duration,
    ) -> Self {
        Self {
            store,
            namespace,
            limit,
            lifetime,
        }
    }

    pub fn key(&self, session: &SessionId) -> String {
        format!("{}:msgs:{}", self.namespace, session)
    }

    /// Count one message. Once the limit is passed the counter is set to
    /// expire within a second, so the session can start over shortly after.
    pub async fn consume(&self, session: &SessionId) -> QuotaDecision {
        let Some(store) = &self.store else {
            return QuotaDecision::Within { used: 0 };
        };

        let key = self.key(session);
        let used = match store.increment(&key, self.lifetime).await {
            Ok(used) => used,
            Err(e) => {
                tracing::warn!(store = store.name(), error = %e, "Counter store failed, skipping message quota");
                metrics::record_store_failure("quota_increment");
                return QuotaDecision::Within { used: 0 };
            }
        };

        if used <= self.limit {
            return QuotaDecision::Within { used };
        }

        tracing::info!(session = %session, used, limit = self.limit, "Message quota exhausted");
        metrics::record_rate_limited(self.namespace, "quota");
        if let Err(e) = store.expire(&key, Duration::from_secs(1)).await {
            tracing::warn!(store = store.name(), error = %e, "Failed to reset exhausted quota");
            metrics::record_store_failure("quota_expire");
        }
        QuotaDecision::Exhausted
    }
}

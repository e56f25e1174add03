//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, window > 0)
//! - Check URLs and the counter store selection are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ProxyConfig, StoreKind};

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ConfigIssue {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigIssue {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, collecting every issue found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        issues.push(ConfigIssue::new("listener.max_body_bytes", "must be > 0"));
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        _ => issues.push(ConfigIssue::new(
            "upstream.base_url",
            format!("'{}' is not an http(s) URL", config.upstream.base_url),
        )),
    }
    if config.upstream.timeout_ms == 0 {
        issues.push(ConfigIssue::new("upstream.timeout_ms", "must be > 0"));
    }

    let rl = &config.rate_limit;
    if rl.window_secs == 0 {
        issues.push(ConfigIssue::new("rate_limit.window_secs", "must be > 0"));
    }
    if rl.store_timeout_ms == 0 {
        issues.push(ConfigIssue::new("rate_limit.store_timeout_ms", "must be > 0"));
    }
    if rl.store == StoreKind::Memory && rl.sweep_interval_secs == 0 {
        issues.push(ConfigIssue::new("rate_limit.sweep_interval_secs", "must be > 0"));
    }
    if rl.store == StoreKind::Upstash && !rl.has_upstash() {
        issues.push(ConfigIssue::new(
            "rate_limit.store",
            "upstash selected but UPSTASH_REDIS_REST_URL / UPSTASH_REDIS_REST_TOKEN are missing",
        ));
    }
    if let Some(raw) = rl.upstash_url.as_deref().filter(|s| !s.trim().is_empty()) {
        if url::Url::parse(raw).is_err() {
            issues.push(ConfigIssue::new(
                "rate_limit.upstash_url",
                format!("'{}' is not a URL", raw),
            ));
        }
    }

    if config.chat.message_limit == 0 {
        issues.push(ConfigIssue::new("chat.message_limit", "must be > 0"));
    }
    if config.chat.session_ttl_secs == 0 {
        issues.push(ConfigIssue::new("chat.session_ttl_secs", "must be > 0"));
    }

    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("timeouts.request_secs", "must be > 0"));
    } else if config.timeouts.request_secs * 1000 <= handler_budget_ms(config) {
        issues.push(ConfigIssue::new(
            "timeouts.request_secs",
            format!(
                "must exceed upstream.timeout_ms plus {} counter store calls ({} ms)",
                STORE_CALLS_PER_REQUEST,
                handler_budget_ms(config)
            ),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Most counter store round trips one request makes (chat: window,
/// quota, quota reset).
const STORE_CALLS_PER_REQUEST: u64 = 3;

/// Worst-case time a handler can spend before it answers on its own.
fn handler_budget_ms(config: &ProxyConfig) -> u64 {
    let store_ms = match config.rate_limit.store {
        StoreKind::Disabled => 0,
        _ => STORE_CALLS_PER_REQUEST * config.rate_limit.store_timeout_ms,
    };
    config.upstream.timeout_ms + store_ms
}

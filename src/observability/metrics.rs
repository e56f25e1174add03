//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dtz_requests_total` (counter): inbound requests by route, status
//! - `dtz_request_duration_seconds` (histogram): inbound latency by route
//! - `dtz_rate_limited_total` (counter): rejections by namespace and reason
//! - `dtz_upstream_requests_total` (counter): upstream calls by endpoint, outcome
//! - `dtz_upstream_duration_seconds` (histogram): upstream latency by endpoint
//! - `dtz_store_failures_total` (counter): counter store errors (limiter failed open)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    counter!("dtz_requests_total", "route" => route.clone(), "status" => status.to_string())
        .increment(1);
    histogram!("dtz_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(namespace: &str, reason: &'static str) {
    counter!("dtz_rate_limited_total", "namespace" => namespace.to_string(), "reason" => reason)
        .increment(1);
}

pub fn record_upstream(endpoint: &str, outcome: &'static str, start: Instant) {
    let endpoint = endpoint.to_string();
    counter!("dtz_upstream_requests_total", "endpoint" => endpoint.clone(), "outcome" => outcome)
        .increment(1);
    histogram!("dtz_upstream_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_store_failure(operation: &'static str) {
    counter!("dtz_store_failures_total", "operation" => operation).increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_provider_calls_total` (counter): provider calls by operation, outcome
//! - `gateway_provider_call_duration_seconds` (histogram): provider latency
//! - `gateway_logins_total` (counter): login attempts by outcome
//! - `gateway_sessions_active` (gauge): sessions held by the store
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are bounded: matched route templates, never raw paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed inbound request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a provider call and its outcome label.
pub fn record_provider_call(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!(
        "gateway_provider_calls_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_provider_call_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_login(outcome: &'static str) {
    counter!("gateway_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_active_sessions(count: usize) {
    gauge!("gateway_sessions_active").set(count as f64);
}

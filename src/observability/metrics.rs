//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): proxied requests by status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `route_lookup_failures_total` (counter): rejected requests by reason
//! - `director_sync_cycles_total` (counter): sync cycles by outcome
//! - `route_candidates` (gauge): candidate count per route
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime. Fails if a recorder is
/// already installed or the listener cannot be created.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("proxy_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_lookup_failure(reason: &'static str) {
    metrics::counter!("route_lookup_failures_total", "reason" => reason).increment(1);
}

pub fn record_sync_cycle(outcome: &'static str) {
    metrics::counter!("director_sync_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_route_candidates(route: &str, count: usize) {
    metrics::gauge!("route_candidates", "route" => route.to_string()).set(count as f64);
}

//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests, latency, route changes, reloads)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by event key and outcome
//! - `router_request_duration_seconds` (histogram): latency by event key
//! - `router_requests_in_flight` (gauge): requests currently dispatching
//! - `router_route_changes_total` (counter): route table mutations by kind
//! - `router_routes` (gauge): routes in the current generation
//! - `router_reloads_total` (counter): filter chain reloads by result

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request_started() {
    gauge!("router_requests_in_flight").increment(1.0);
}

pub fn record_request(event: &str, outcome: &'static str, elapsed: Duration) {
    gauge!("router_requests_in_flight").decrement(1.0);
    counter!("router_requests_total", "event" => event.to_string(), "outcome" => outcome).increment(1);
    histogram!("router_request_duration_seconds", "event" => event.to_string()).record(elapsed.as_secs_f64());
}

pub fn record_route_change(kind: &'static str) {
    counter!("router_route_changes_total", "kind" => kind).increment(1);
}

pub fn record_route_count(count: usize) {
    gauge!("router_routes").set(count as f64);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("router_reloads_total", "result" => result).increment(1);
}

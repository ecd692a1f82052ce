//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mentat_requests_total` (counter): requests by method, route, status
//! - `mentat_request_duration_seconds` (histogram): latency distribution
//! - `mentat_socket_connections` (gauge): current socket count
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Route labels use the declared path, not the concrete URI

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("mentat_requests_total", &labels).increment(1);
    metrics::histogram!("mentat_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_socket_count(count: usize) {
    metrics::gauge!("mentat_socket_connections").set(count as f64);
}

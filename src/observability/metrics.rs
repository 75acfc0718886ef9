//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_listener_requests_total` (counter): requests by status
//! - `http_listener_request_duration_seconds` (histogram): handling latency
//! - `http_listener_metrics_forwarded_total` (counter): metrics handed to the sink
//! - `http_listener_body_bytes_total` (counter): decoded payload bytes

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("http_listener_requests_total", "status" => status.to_string()).increment(1);
    histogram!("http_listener_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_forwarded(count: usize) {
    counter!("http_listener_metrics_forwarded_total").increment(count as u64);
}

pub fn record_body_bytes(len: usize) {
    counter!("http_listener_body_bytes_total").increment(len as u64);
}

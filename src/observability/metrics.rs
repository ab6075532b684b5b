//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shim_requests_total` (counter): requests by method, status, destination
//! - `shim_request_duration_seconds` (histogram): latency distribution
//! - `shim_php_probes_total` (counter): flagged PHP probes by country
//! - `shim_telemetry_failures_total` (counter): dropped telemetry writes
//! - `shim_report_cache_total` (counter): reporting lookups by report and HIT/MISS

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, destination: &'static str, start: Instant) {
    counter!(
        "shim_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "destination" => destination
    )
    .increment(1);
    histogram!("shim_request_duration_seconds", "destination" => destination)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_probe(country: &str) {
    counter!("shim_php_probes_total", "country" => country.to_string()).increment(1);
}

pub fn record_telemetry_failure() {
    counter!("shim_telemetry_failures_total").increment(1);
}

pub fn record_report_cache(report: &'static str, status: &'static str) {
    counter!("shim_report_cache_total", "report" => report, "status" => status).increment(1);
}

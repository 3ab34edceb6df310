//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch metrics (request count, latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `switchyard_dispatch_total` (counter): dispatches by method, outcome, status
//! - `switchyard_dispatch_duration_seconds` (histogram): time spent in dispatch
//!
//! # Design Decisions
//! - Recorded by the HTTP host, keeping the dispatch core free of side channels
//! - Without an installed recorder every call is a no-op
//! - Labels stay low-cardinality: no paths, only route outcome classes

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// How a dispatch ended, as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchLabel {
    Handled,
    Halted,
    NotFound,
    Failed,
}

impl DispatchLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchLabel::Handled => "handled",
            DispatchLabel::Halted => "halted",
            DispatchLabel::NotFound => "not_found",
            DispatchLabel::Failed => "failed",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatch.
pub fn record_dispatch(method: &str, label: DispatchLabel, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("outcome", label.as_str().to_string()),
        ("status", status.to_string()),
    ];

    metrics::counter!("switchyard_dispatch_total", &labels).increment(1);
    metrics::histogram!("switchyard_dispatch_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

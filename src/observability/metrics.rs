//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, upstream
//! - `proxy_request_duration_seconds` (histogram): upstream call latency
//! - `proxy_queue_wait_seconds` (histogram): time a work item waited for a worker
//! - `proxy_in_flight_requests` (gauge): inbound requests awaiting completion
//!
//! Recording is a no-op until an exporter is installed.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed upstream request.
pub fn record_request(method: &str, status: u16, upstream: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("upstream", upstream.to_string()),
    ];
    ::metrics::counter!("proxy_requests_total", &labels).increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record how long a work item sat in the dispatch queue.
pub fn record_queue_wait(enqueued_at: Instant) {
    ::metrics::histogram!("proxy_queue_wait_seconds").record(enqueued_at.elapsed().as_secs_f64());
}

/// Tracks one inbound request awaiting completion for its lifetime.
pub struct InFlightGuard(());

impl InFlightGuard {
    pub fn new() -> Self {
        ::metrics::gauge!("proxy_in_flight_requests").increment(1.0);
        Self(())
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        ::metrics::gauge!("proxy_in_flight_requests").decrement(1.0);
    }
}

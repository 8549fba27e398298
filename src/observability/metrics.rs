//! Metrics for the telemetry pipeline itself.
//!
//! # Metrics
//! - `telemetry_events_enqueued_total` (counter): events accepted by the queue
//! - `telemetry_events_dropped_total` (counter): events refused, by reason
//! - `telemetry_batches_total` (counter): batch requests, by outcome
//! - `telemetry_batch_events_total` (counter): events carried by batches, by outcome
//! - `telemetry_batch_duration_seconds` (histogram): batch request latency

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_event_enqueued() {
    counter!("telemetry_events_enqueued_total").increment(1);
}

pub fn record_event_dropped(reason: &'static str) {
    counter!("telemetry_events_dropped_total", "reason" => reason).increment(1);
}

pub fn record_batch(outcome: &'static str, events: usize, start: Instant) {
    counter!("telemetry_batches_total", "outcome" => outcome).increment(1);
    counter!("telemetry_batch_events_total", "outcome" => outcome).increment(events as u64);
    histogram!("telemetry_batch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rendezvous_validations_total` (counter): round trips by outcome
//! - `rendezvous_poll_attempts` (histogram): retries spent per round trip
//! - `rendezvous_ingested_total` (counter): response messages by result
//! - `bus_published_total` (counter): commands and responses by topic
//! - `circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `circuit_breaker_calls_total` (counter): guarded calls by result

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_validation(outcome: &'static str) {
    ::metrics::counter!("rendezvous_validations_total", "outcome" => outcome).increment(1);
}

pub fn record_poll_attempts(attempts: u32) {
    ::metrics::histogram!("rendezvous_poll_attempts").record(attempts as f64);
}

pub fn record_ingested(result: &'static str) {
    ::metrics::counter!("rendezvous_ingested_total", "result" => result).increment(1);
}

pub fn record_published(topic: &str) {
    ::metrics::counter!("bus_published_total", "topic" => topic.to_string()).increment(1);
}

pub fn record_circuit_state(name: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    ::metrics::gauge!("circuit_breaker_state", "name" => name.to_string()).set(value);
}

pub fn record_guarded_call(name: &str, result: &'static str) {
    ::metrics::counter!(
        "circuit_breaker_calls_total",
        "name" => name.to_string(),
        "result" => result
    )
    .increment(1);
}

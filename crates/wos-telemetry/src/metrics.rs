//! Prometheus metrics for the API gateway.
//!
//! Covers:
//! - Request outcomes and latency per method
//! - Automatic 5xx retries
//! - Hardware signature gating decisions and signer failures
//! - Calls currently in flight
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric names,
//! a programming error that should crash at first use rather than be ignored.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};

/// Total calls by method and outcome.
/// Labels: method, outcome (ok/unauthorized/rate_limited/server_error/client_error/transport/gated/decode/invalid)
pub static REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "wos_requests_total",
        "Total gateway calls by method and outcome",
        &["method", "outcome"]
    )
    .unwrap()
});

/// Total automatic retries after a server error.
pub static RETRIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "wos_retries_total",
        "Total automatic retries after a 5xx response",
        &["method"]
    )
    .unwrap()
});

/// Gating decisions.
/// Labels: decision (open/critical/high_value/amount_missing)
pub static GATE_DECISIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "wos_gate_decisions_total",
        "Hardware signature gating decisions",
        &["decision"]
    )
    .unwrap()
});

/// Signer failures that short-circuited a call.
pub static SIGNATURE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "wos_signature_failures_total",
        "Hardware signer failures by gating reason",
        &["reason"]
    )
    .unwrap()
});

/// Calls currently in flight.
pub static IN_FLIGHT: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("wos_in_flight", "Gateway calls in flight").unwrap());

/// Wall time per call in milliseconds, retries included.
pub static REQUEST_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "wos_request_latency_ms",
        "Gateway call latency in milliseconds",
        &["method"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record the outcome of a call.
    pub fn request_finished(method: &str, outcome: &str, latency_ms: f64) {
        REQUESTS_TOTAL.with_label_values(&[method, outcome]).inc();
        REQUEST_LATENCY_MS
            .with_label_values(&[method])
            .observe(latency_ms);
    }

    pub fn retry(method: &str) {
        RETRIES_TOTAL.with_label_values(&[method]).inc();
    }

    pub fn gate_decision(decision: &str) {
        GATE_DECISIONS_TOTAL.with_label_values(&[decision]).inc();
    }

    pub fn signature_failed(reason: &str) {
        SIGNATURE_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Handle to the process-wide in-flight gauge. Every tracker adds to it.
    pub fn in_flight_gauge() -> IntGauge {
        IN_FLIGHT.clone()
    }
}

/// Render the default registry in the Prometheus text exposition format.
pub fn gather_text() -> TelemetryResult<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_recorded_series() {
        Metrics::request_finished("GET", "ok", 12.0);
        Metrics::gate_decision("critical");
        Metrics::in_flight_gauge().inc();
        Metrics::in_flight_gauge().dec();

        let text = gather_text().unwrap();
        assert!(text.contains("wos_requests_total"));
        assert!(text.contains("wos_gate_decisions_total"));
        assert!(text.contains("wos_in_flight"));
    }
}

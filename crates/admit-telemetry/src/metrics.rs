//! Prometheus metrics for the admission pipeline.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric
//! names, which is a startup bug; it can only happen during static
//! initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Requests evaluated by the pipeline.
/// Labels: kind (order/cancel), outcome (approved/denied)
pub static REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admit_requests_total",
        "Total requests evaluated by the admission pipeline",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Denials attributed to the rule that issued them.
pub static RULE_DENIED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admit_rule_denied_total",
        "Total requests denied, by rule",
        &["rule", "kind"]
    )
    .unwrap()
});

/// Time spent evaluating one request across all rules.
pub static CHECK_LATENCY_US: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "admit_check_latency_us",
        "Pipeline evaluation latency in microseconds",
        &["kind"],
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Events routed to rules.
pub static EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admit_events_total",
        "Total events delivered to the engine",
        &["kind"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a request that passed every active rule.
    pub fn request_approved(kind: &str) {
        REQUESTS_TOTAL.with_label_values(&[kind, "approved"]).inc();
    }

    /// Record a denied request and the rule that denied it.
    pub fn request_denied(kind: &str, rule: &str) {
        REQUESTS_TOTAL.with_label_values(&[kind, "denied"]).inc();
        RULE_DENIED_TOTAL.with_label_values(&[rule, kind]).inc();
    }

    pub fn check_latency(kind: &str, latency_us: f64) {
        CHECK_LATENCY_US
            .with_label_values(&[kind])
            .observe(latency_us);
    }

    pub fn event_routed(kind: &str) {
        EVENTS_TOTAL.with_label_values(&[kind]).inc();
    }
}

/// Render every registered metric in the Prometheus text format.
pub fn encode_metrics() -> TelemetryResult<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_counted_per_rule() {
        let before = RULE_DENIED_TOTAL
            .with_label_values(&["order_size", "order"])
            .get();
        Metrics::request_denied("order", "order_size");
        let after = RULE_DENIED_TOTAL
            .with_label_values(&["order_size", "order"])
            .get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn test_encode_contains_metric_names() {
        Metrics::request_approved("cancel");
        Metrics::check_latency("cancel", 3.0);
        Metrics::event_routed("timer");

        let text = encode_metrics().unwrap();
        assert!(text.contains("admit_requests_total"));
        assert!(text.contains("admit_check_latency_us"));
        assert!(text.contains("admit_events_total"));
    }
}

//! Prometheus metrics and structured logging for the admit pipeline.
//!
//! - Request outcomes, per-rule denials and check latency as Prometheus metrics
//! - Structured logging with tracing (JSON in production, pretty otherwise)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, DEFAULT_FILTER};
pub use metrics::{encode_metrics, Metrics};

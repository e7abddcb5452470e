//! Prometheus metrics and structured logging for the Widget OS API gateway.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for request outcomes, retries, gating and in-flight calls

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{gather_text, Metrics};
pub use prometheus::IntGauge;

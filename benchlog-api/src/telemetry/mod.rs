//! Benchlog Telemetry
//!
//! Structured logging for the API layer via `tracing-subscriber`.

pub mod tracer;

pub use tracer::{init_tracer, LogFormat, TelemetryConfig};

//! Infrastructure Layer - Adapters and ambient services.
//!
//! Concrete implementations of the application ports plus configuration,
//! logging and metrics.

/// Streamer protocol adapters: codec, authentication, dispatch, transport.
pub mod streamer;

/// Environment configuration.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;

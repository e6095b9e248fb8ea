//! Configuration Module
//!
//! Environment-driven configuration for the streamer binary.

mod settings;

pub use settings::{ConfigError, DEFAULT_METRICS_PORT, StreamerConfig};

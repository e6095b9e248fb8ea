//! Prometheus Metrics Module
//!
//! Counters for the streamer session, exported in Prometheus format.
//!
//! # Metrics
//!
//! - `td_streamer_messages_received_total`: inbound transport messages
//! - `td_streamer_frames_decoded_total`: data/snapshot frames by service
//! - `td_streamer_malformed_frames_total`: frames dropped by the codec
//! - `td_streamer_requests_sent_total`: outbound envelopes by service and command
//! - `td_streamer_auth_total`: LOGIN outcomes
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

static INSTALLED: OnceLock<SocketAddr> = OnceLock::new();

/// Install the Prometheus exporter with an HTTP listener on `port`.
///
/// A port of `0` leaves metrics disabled. Calling again after a successful
/// install is a no-op.
///
/// # Errors
///
/// Returns an error if the recorder or the listener cannot be installed.
pub fn init_metrics(port: u16) -> Result<(), BuildError> {
    if port == 0 || INSTALLED.get().is_some() {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metrics();
    let _ = INSTALLED.set(addr);

    tracing::info!(%addr, "Prometheus metrics listener started");
    Ok(())
}

fn register_metrics() {
    describe_counter!(
        "td_streamer_messages_received_total",
        "Total messages received from the streamer"
    );
    describe_counter!(
        "td_streamer_frames_decoded_total",
        "Total data and snapshot frames decoded by service"
    );
    describe_counter!(
        "td_streamer_malformed_frames_total",
        "Total inbound frames dropped as malformed"
    );
    describe_counter!(
        "td_streamer_requests_sent_total",
        "Total request envelopes sent by service and command"
    );
    describe_counter!("td_streamer_auth_total", "LOGIN outcomes");
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// LOGIN outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// LOGIN accepted.
    Success,
    /// LOGIN rejected or connection lost first.
    Failure,
}

impl AuthOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Record one inbound transport message.
pub fn record_message_received() {
    counter!("td_streamer_messages_received_total").increment(1);
}

/// Record a decoded data or snapshot frame.
pub fn record_frame_decoded(service: &str) {
    counter!(
        "td_streamer_frames_decoded_total",
        "service" => service.to_string()
    )
    .increment(1);
}

/// Record a dropped frame.
pub fn record_malformed_frame(kind: &'static str) {
    counter!("td_streamer_malformed_frames_total", "kind" => kind).increment(1);
}

/// Record an outbound request envelope.
pub fn record_request_sent(service: &str, command: &str) {
    counter!(
        "td_streamer_requests_sent_total",
        "service" => service.to_string(),
        "command" => command.to_string()
    )
    .increment(1);
}

/// Record a LOGIN outcome.
pub fn record_auth(outcome: AuthOutcome) {
    counter!("td_streamer_auth_total", "outcome" => outcome.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_outcome_as_str() {
        assert_eq!(AuthOutcome::Success.as_str(), "success");
        assert_eq!(AuthOutcome::Failure.as_str(), "failure");
    }

    #[test]
    fn zero_port_leaves_metrics_disabled() {
        assert!(init_metrics(0).is_ok());
        assert!(INSTALLED.get().is_none());
    }

    #[test]
    fn recording_without_exporter_is_noop() {
        record_message_received();
        record_frame_decoded("CHART_EQUITY");
        record_malformed_frame("data");
        record_request_sent("ADMIN", "LOGIN");
        record_auth(AuthOutcome::Success);
    }
}

//! Response Dispatcher
//!
//! Turns inbound streamer text into [`StreamerEvent`]s:
//!
//! - `response`: LOGIN entries go to the [`AuthenticationController`]; the
//!   raw text is emitted once as [`StreamerEvent::Message`]
//! - `data` / `snapshot`: records re-keyed by field name, emitted per frame
//!   under the service's category
//! - `notify`: heartbeats emitted unmodified
//!
//! Events come back in the order the frames appeared in the message.

use std::fmt;

use super::auth::{AuthError, AuthenticationController};
use super::codec::JsonCodec;
use super::messages::{DataFrame, InboundFrame, ResponseFrame};
use crate::domain::schema::{EventCategory, FieldSchemaRegistry};
use crate::infrastructure::metrics::{self, AuthOutcome};

// =============================================================================
// Events
// =============================================================================

/// Events delivered to streamer consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamerEvent {
    /// LOGIN accepted. Emitted once per connection.
    Authenticated,
    /// LOGIN rejected, or the connection closed before the response.
    AuthenticationFailed(AuthError),
    /// Raw text of an inbound `response` message.
    Message(String),
    /// A decoded data or snapshot frame.
    Data {
        /// Event category of the frame's service.
        category: EventCategory,
        /// The frame with named records.
        frame: DataFrame,
        /// Whether the frame came from a `snapshot` list.
        snapshot: bool,
    },
    /// Heartbeat value.
    Heartbeat(String),
    /// The transport closed.
    Disconnected,
}

impl StreamerEvent {
    /// Event name, e.g. `authenticated` or `chart`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::Message(_) => "message",
            Self::Data { category, .. } => category.as_str(),
            Self::Heartbeat(_) => "heartbeat",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for StreamerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Classifies and decodes inbound messages.
#[derive(Debug, Default, Clone)]
pub struct ResponseDispatcher {
    codec: JsonCodec,
    registry: FieldSchemaRegistry,
}

impl ResponseDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub const fn new(registry: FieldSchemaRegistry) -> Self {
        Self {
            codec: JsonCodec::new(),
            registry,
        }
    }

    /// Dispatch one inbound message.
    ///
    /// `auth` receives LOGIN responses when a handshake is in progress.
    /// Malformed messages produce no events.
    pub fn dispatch(
        &self,
        text: &str,
        mut auth: Option<&mut AuthenticationController>,
    ) -> Vec<StreamerEvent> {
        metrics::record_message_received();

        let frames = match self.codec.decode(text) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed message");
                metrics::record_malformed_frame("message");
                return Vec::new();
            }
        };

        let mut events = Vec::with_capacity(frames.len());
        let mut message_emitted = false;

        for frame in frames {
            match frame {
                InboundFrame::Response(response) => {
                    if !message_emitted {
                        events.push(StreamerEvent::Message(text.to_string()));
                        message_emitted = true;
                    }
                    if let Some(auth) = auth.as_deref_mut() {
                        events.extend(Self::on_response(auth, &response));
                    }
                }
                InboundFrame::Data(frame) => events.extend(self.decode_data(frame, false)),
                InboundFrame::Snapshot(frame) => events.extend(self.decode_data(frame, true)),
                InboundFrame::Notify(notify) => match notify.heartbeat {
                    Some(heartbeat) => events.push(StreamerEvent::Heartbeat(heartbeat)),
                    None => tracing::debug!("Ignoring notify entry without heartbeat"),
                },
            }
        }

        events
    }

    fn on_response(
        auth: &mut AuthenticationController,
        response: &ResponseFrame,
    ) -> Option<StreamerEvent> {
        match auth.on_response(response)? {
            Ok(()) => {
                tracing::info!("Streamer authenticated");
                metrics::record_auth(AuthOutcome::Success);
                Some(StreamerEvent::Authenticated)
            }
            Err(e) => {
                tracing::error!(error = %e, "Streamer authentication failed");
                metrics::record_auth(AuthOutcome::Failure);
                Some(StreamerEvent::AuthenticationFailed(e))
            }
        }
    }

    fn decode_data(&self, mut frame: DataFrame, snapshot: bool) -> Option<StreamerEvent> {
        let schema = match self.registry.schema(&frame.service) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(service = %frame.service, error = %e, "Skipping frame");
                metrics::record_malformed_frame("data");
                return None;
            }
        };

        frame.content = std::mem::take(&mut frame.content)
            .into_iter()
            .map(|record| schema.names_for(record))
            .collect();

        metrics::record_frame_decoded(&frame.service);

        Some(StreamerEvent::Data {
            category: schema.service().category(),
            frame,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::domain::request::RequestBuilder;
    use crate::domain::session::{SessionContext, UserPrincipals};
    use crate::infrastructure::streamer::auth::AuthState;

    const FIXTURE: &str = include_str!("../../../tests/fixtures/user_principals.json");

    fn awaiting_auth() -> AuthenticationController {
        let principals = UserPrincipals::from_json(FIXTURE).unwrap();
        let session = SessionContext::from_principals(&principals).unwrap();
        let builder = RequestBuilder::new(Arc::new(session), Arc::new(|| "id".to_string()));
        let mut auth = AuthenticationController::new();
        auth.on_transport_open(&builder).unwrap();
        auth
    }

    fn dispatcher() -> ResponseDispatcher {
        ResponseDispatcher::new(FieldSchemaRegistry::new())
    }

    #[test]
    fn test_login_response_emits_message_then_authenticated() {
        let mut auth = awaiting_auth();
        let text = r#"{"response":[{"service":"ADMIN","command":"LOGIN","content":{"code":0}}]}"#;

        let events = dispatcher().dispatch(text, Some(&mut auth));

        assert_eq!(
            events,
            vec![
                StreamerEvent::Message(text.to_string()),
                StreamerEvent::Authenticated
            ]
        );
        assert_eq!(auth.state(), AuthState::Authenticated);
    }

    #[test]
    fn test_rejected_login_emits_failure() {
        let mut auth = awaiting_auth();
        let text = r#"{"response":[{"service":"ADMIN","command":"LOGIN","content":{"code":3,"msg":"denied"}}]}"#;

        let events = dispatcher().dispatch(text, Some(&mut auth));

        assert_eq!(
            events[1],
            StreamerEvent::AuthenticationFailed(AuthError::Rejected {
                code: 3,
                message: "denied".to_string()
            })
        );
    }

    #[test]
    fn test_multiple_responses_emit_one_message() {
        let text = json!({"response": [
            {"service": "CHART_EQUITY", "command": "SUBS", "content": {"code": 0}},
            {"service": "TIMESALE_EQUITY", "command": "SUBS", "content": {"code": 0}}
        ]})
        .to_string();

        let events = dispatcher().dispatch(&text, None);

        assert_eq!(events, vec![StreamerEvent::Message(text.clone())]);
    }

    #[test]
    fn test_chart_equity_data_is_decoded() {
        let text = json!({"data": [{
            "service": "CHART_EQUITY",
            "timestamp": 1_594_480_424_741_i64,
            "command": "SUBS",
            "content": [{
                "1": 318.01, "2": 318.15, "3": 318.01, "4": 318.1,
                "5": 4460, "6": 779, "7": 1_594_425_540_000_i64, "8": 18453,
                "seq": 707, "key": "SPY"
            }]
        }]})
        .to_string();

        let events = dispatcher().dispatch(&text, None);

        let [StreamerEvent::Data { category, frame, snapshot }] = events.as_slice() else {
            panic!("expected one data event, got {events:?}");
        };
        assert_eq!(*category, EventCategory::Chart);
        assert!(!snapshot);
        assert_eq!(frame.timestamp, Some(1_594_480_424_741));
        assert_eq!(
            serde_json::to_value(&frame.content[0]).unwrap(),
            json!({
                "openPrice": 318.01, "highPrice": 318.15, "lowPrice": 318.01,
                "closePrice": 318.1, "volume": 4460, "sequence": 779,
                "chartTime": 1_594_425_540_000_i64, "seq": 707, "key": "SPY"
            })
        );
    }

    #[test]
    fn test_snapshot_is_flagged() {
        let text = json!({"snapshot": [{"service": "QUOTE", "content": [{"key": "SPY", "1": 1.5}]}]})
            .to_string();

        let events = dispatcher().dispatch(&text, None);

        assert!(matches!(
            &events[0],
            StreamerEvent::Data { category: EventCategory::Quote, snapshot: true, frame }
                if frame.content[0].get("bidPrice") == Some(&json!(1.5))
        ));
    }

    #[test]
    fn test_unknown_service_frame_is_skipped() {
        let text = json!({"data": [
            {"service": "MYSTERY", "content": [{"1": 1}]},
            {"service": "TIMESALE_FOREX", "content": [{"key": "EUR/USD", "2": 1.1}]}
        ]})
        .to_string();

        let events = dispatcher().dispatch(&text, None);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "timesale");
    }

    #[test]
    fn test_heartbeat_passes_through() {
        let events = dispatcher().dispatch(r#"{"notify":[{"heartbeat":"1595384500929"}]}"#, None);
        assert_eq!(
            events,
            vec![StreamerEvent::Heartbeat("1595384500929".to_string())]
        );
    }

    #[test]
    fn test_malformed_message_produces_nothing() {
        assert!(dispatcher().dispatch("{not json", None).is_empty());
        assert!(dispatcher().dispatch("\"just a string\"", None).is_empty());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(StreamerEvent::Authenticated.name(), "authenticated");
        assert_eq!(
            StreamerEvent::AuthenticationFailed(AuthError::MissingCode).name(),
            "authentication_failed"
        );
        assert_eq!(StreamerEvent::Message(String::new()).name(), "message");
        assert_eq!(StreamerEvent::Heartbeat(String::new()).name(), "heartbeat");
        assert_eq!(StreamerEvent::Disconnected.to_string(), "disconnected");
    }
}

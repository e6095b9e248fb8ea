//! Streamer Message Types
//!
//! Inbound frames as they arrive from the streamer. Every inbound message is
//! a JSON object keyed by frame kind, each holding an array:
//!
//! ```json
//! {"response":[{"service":"ADMIN","command":"LOGIN","content":{"code":0}}]}
//! {"data":[{"service":"CHART_EQUITY","timestamp":1594480424741,
//!           "command":"SUBS","content":[{"key":"SPY","1":318.01}]}]}
//! {"notify":[{"heartbeat":"1595384500929"}]}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::schema::Record;

// =============================================================================
// Frame Kinds
// =============================================================================

/// Top-level key of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Command acknowledgements.
    Response,
    /// Streaming updates.
    Data,
    /// Initial snapshots, same shape as `data`.
    Snapshot,
    /// Heartbeats and notices.
    Notify,
}

impl FrameKind {
    /// Map a top-level key to a frame kind.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "response" => Some(Self::Response),
            "data" => Some(Self::Data),
            "snapshot" => Some(Self::Snapshot),
            "notify" => Some(Self::Notify),
            _ => None,
        }
    }

    /// Wire key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Data => "data",
            Self::Snapshot => "snapshot",
            Self::Notify => "notify",
        }
    }
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Entry of a `response` array.
    Response(ResponseFrame),
    /// Entry of a `data` array.
    Data(DataFrame),
    /// Entry of a `snapshot` array.
    Snapshot(DataFrame),
    /// Entry of a `notify` array.
    Notify(NotifyFrame),
}

// =============================================================================
// Frames
// =============================================================================

/// Acknowledgement of a request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseFrame {
    /// Service the request targeted.
    #[serde(default)]
    pub service: String,
    /// Id of the acknowledged request.
    #[serde(default)]
    pub requestid: Option<String>,
    /// Command that was acknowledged.
    #[serde(default)]
    pub command: String,
    /// Server time in epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
    /// Result payload, normally `{"code": n, "msg": "..."}`.
    #[serde(default)]
    pub content: Value,
}

impl ResponseFrame {
    /// Whether this acknowledges a LOGIN.
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.service == "ADMIN" && self.command == "LOGIN"
    }

    /// Numeric result code, if present.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.content.get("code").and_then(Value::as_i64)
    }

    /// Server message, if present.
    #[must_use]
    pub fn msg(&self) -> Option<&str> {
        self.content.get("msg").and_then(Value::as_str)
    }
}

/// Streaming update for one service.
///
/// Records arrive keyed by wire index and are re-keyed by field name before
/// they reach callers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DataFrame {
    /// Source service.
    pub service: String,
    /// Server time in epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
    /// Command that produced the update.
    #[serde(default)]
    pub command: String,
    /// Records.
    #[serde(default)]
    pub content: Vec<Record>,
}

/// Notification entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotifyFrame {
    /// Heartbeat value, passed through unmodified.
    #[serde(default)]
    pub heartbeat: Option<String>,
}

/// Reads a millisecond timestamp sent as an integer, a float or a numeric
/// string. Anything else reads as `None` rather than failing the frame.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_millis))
        }
        _ => None,
    };
    Ok(millis)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_millis(value: f64) -> Option<i64> {
    (value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64)
        .then(|| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_frame_kind_keys() {
        for kind in [
            FrameKind::Response,
            FrameKind::Data,
            FrameKind::Snapshot,
            FrameKind::Notify,
        ] {
            assert_eq!(FrameKind::from_key(kind.as_str()), Some(kind));
        }
        assert_eq!(FrameKind::from_key("bogus"), None);
    }

    #[test]
    fn test_response_frame_code_and_msg() {
        let frame: ResponseFrame = serde_json::from_value(json!({
            "service": "ADMIN",
            "requestid": "1",
            "command": "LOGIN",
            "timestamp": 1_594_480_424_741_i64,
            "content": {"code": 3, "msg": "Login denied"}
        }))
        .unwrap();

        assert!(frame.is_login());
        assert_eq!(frame.code(), Some(3));
        assert_eq!(frame.msg(), Some("Login denied"));
    }

    #[test]
    fn test_response_frame_non_numeric_code() {
        let frame: ResponseFrame = serde_json::from_value(json!({
            "service": "ADMIN",
            "command": "LOGIN",
            "content": {"code": "0"}
        }))
        .unwrap();

        assert_eq!(frame.code(), None);
    }

    #[test]
    fn test_data_frame_defaults() {
        let frame: DataFrame =
            serde_json::from_value(json!({"service": "QUOTE", "content": [{"key": "SPY"}]}))
                .unwrap();

        assert_eq!(frame.timestamp, None);
        assert!(frame.command.is_empty());
        assert_eq!(frame.content.len(), 1);
    }

    #[test_case(json!(1_594_480_424_741_i64), Some(1_594_480_424_741) ; "integer")]
    #[test_case(json!(1_594_480_424_741.9), Some(1_594_480_424_741) ; "float")]
    #[test_case(json!("1594480424741"), Some(1_594_480_424_741) ; "string")]
    #[test_case(json!(" 1594480424741.5 "), Some(1_594_480_424_741) ; "float string")]
    #[test_case(json!("soon"), None ; "non numeric string")]
    #[test_case(json!(null), None ; "null")]
    #[test_case(json!({"ms": 1}), None ; "object")]
    fn test_timestamp_is_lenient(timestamp: Value, expected: Option<i64>) {
        let frame: DataFrame = serde_json::from_value(json!({
            "service": "TIMESALE_EQUITY",
            "timestamp": timestamp,
            "content": [{"key": "SPY", "2": 1.5}]
        }))
        .unwrap();

        assert_eq!(frame.timestamp, expected);
        assert_eq!(frame.content.len(), 1);
    }

    #[test]
    fn test_response_frame_float_timestamp() {
        let frame: ResponseFrame = serde_json::from_value(json!({
            "service": "ADMIN",
            "command": "LOGIN",
            "timestamp": 1_595_384_500_929.0,
            "content": {"code": 0}
        }))
        .unwrap();

        assert_eq!(frame.timestamp, Some(1_595_384_500_929));
        assert_eq!(frame.code(), Some(0));
    }
}

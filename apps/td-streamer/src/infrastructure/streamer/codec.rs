//! Streamer Codec
//!
//! Decodes inbound streamer text into [`InboundFrame`]s and encodes outbound
//! values as JSON text.
//!
//! Inbound messages are objects whose keys name the frame kind. Each entry of
//! each array is decoded on its own: a malformed entry is logged and skipped
//! and its neighbours still come through. Unknown top-level keys are ignored.

use serde_json::Value;

use super::messages::{DataFrame, FrameKind, InboundFrame, NotifyFrame, ResponseFrame};
use crate::infrastructure::metrics;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// The message or a frame does not have the expected shape.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

/// JSON codec for the streamer WebSocket.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode an inbound message into frames, in document order.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not a JSON object.
    /// Individual malformed frames do not fail the message.
    pub fn decode(&self, text: &str) -> Result<Vec<InboundFrame>, CodecError> {
        let value: Value = serde_json::from_str(text.trim())?;

        let Value::Object(message) = value else {
            return Err(CodecError::MalformedFrame(format!(
                "expected JSON object, got: {}...",
                text.chars().take(50).collect::<String>()
            )));
        };

        let mut frames = Vec::new();

        for (key, entries) in message {
            let Some(kind) = FrameKind::from_key(&key) else {
                tracing::trace!(key = %key, "Ignoring unknown top-level key");
                continue;
            };

            let Value::Array(entries) = entries else {
                tracing::warn!(kind = kind.as_str(), "Frame list is not an array, skipping");
                metrics::record_malformed_frame(kind.as_str());
                continue;
            };

            for entry in entries {
                match Self::decode_frame(kind, entry) {
                    Ok(frame) => frames.push(frame),
                    Err(e) => {
                        tracing::warn!(kind = kind.as_str(), error = %e, "Skipping malformed frame");
                        metrics::record_malformed_frame(kind.as_str());
                    }
                }
            }
        }

        Ok(frames)
    }

    fn decode_frame(kind: FrameKind, value: Value) -> Result<InboundFrame, CodecError> {
        if !value.is_object() {
            return Err(CodecError::MalformedFrame(format!(
                "{} entry is not an object",
                kind.as_str()
            )));
        }

        Ok(match kind {
            FrameKind::Response => {
                InboundFrame::Response(serde_json::from_value::<ResponseFrame>(value)?)
            }
            FrameKind::Data => InboundFrame::Data(serde_json::from_value::<DataFrame>(value)?),
            FrameKind::Snapshot => {
                InboundFrame::Snapshot(serde_json::from_value::<DataFrame>(value)?)
            }
            FrameKind::Notify => InboundFrame::Notify(serde_json::from_value::<NotifyFrame>(value)?),
        })
    }

    /// Encode a value to JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

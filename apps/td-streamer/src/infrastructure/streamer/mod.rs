//! Streamer Adapters
//!
//! Implements the client side of the streamer WebSocket protocol:
//!
//! - **messages**: inbound frame types
//! - **codec**: JSON decoding of inbound messages
//! - **auth**: LOGIN state machine
//! - **dispatcher**: frame classification and field-name decoding
//! - **client**: the [`Streamer`] facade
//! - **websocket**: `tokio-tungstenite` transport
//! - **ids**: UUID request ids

pub mod auth;
pub mod client;
pub mod codec;
pub mod dispatcher;
pub mod ids;
pub mod messages;
pub mod websocket;

pub use auth::{AuthError, AuthState, AuthenticationController};
pub use client::{Streamer, StreamerError};
pub use codec::{CodecError, JsonCodec};
pub use dispatcher::{ResponseDispatcher, StreamerEvent};
pub use ids::UuidGenerator;
pub use messages::{DataFrame, FrameKind, InboundFrame, NotifyFrame, ResponseFrame};
pub use websocket::WebSocketTransport;

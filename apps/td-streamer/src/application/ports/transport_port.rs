//! Transport Port (Driven Port)
//!
//! A persistent, bidirectional text-frame connection. Adapters report
//! lifecycle and inbound frames as [`ConnectionEvent`]s on a channel handed to
//! them at construction; the streamer consumes that channel in order.
//!
//! Every `open` starts a new connection with its own [`ConnectionId`]. Events
//! from a connection that has since been replaced may still be in flight and
//! are told apart by that id.

use std::fmt;

/// Transport error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The transport is not open.
    #[error("transport is not connected")]
    NotConnected,

    /// The transport is already open.
    #[error("transport is already connected")]
    AlreadyConnected,

    /// The outbound queue is gone.
    #[error("transport send failed: {message}")]
    SendFailed {
        /// Failure detail.
        message: String,
    },

    /// Connection setup failed.
    #[error("transport connection failed: {message}")]
    ConnectionFailed {
        /// Failure detail.
        message: String,
    },
}

/// Lifecycle and inbound events reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The connection ended, cleanly or not.
    Closed,
}

/// Identifies the connection started by one `open` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw connection number.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw connection number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A [`TransportEvent`] tagged with the connection it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    /// Source connection.
    pub connection: ConnectionId,
    /// The event.
    pub event: TransportEvent,
}

impl ConnectionEvent {
    /// Tag `event` with `connection`.
    #[must_use]
    pub const fn new(connection: ConnectionId, event: TransportEvent) -> Self {
        Self { connection, event }
    }
}

/// Port for the streamer connection.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Start a new connection. Completion is reported as
    /// [`TransportEvent::Opened`] tagged with the returned id.
    ///
    /// # Errors
    ///
    /// Returns error if the transport is already open or cannot start.
    fn open(&self) -> Result<ConnectionId, TransportError>;

    /// Queue a text frame. Frames are written in call order.
    ///
    /// # Errors
    ///
    /// Returns error if the transport is not open.
    fn send(&self, text: String) -> Result<(), TransportError>;

    /// Close the connection. `force` skips the close handshake.
    fn close(&self, force: bool);
}

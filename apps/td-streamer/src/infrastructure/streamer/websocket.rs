//! WebSocket Transport
//!
//! [`Transport`] adapter over `tokio-tungstenite`. Each `open` spawns a
//! connection task that owns the socket:
//!
//! - inbound text frames become [`TransportEvent::Message`]
//! - outbound text is drained from an unbounded FIFO queue
//! - pings are answered with pongs
//!
//! The task reports [`TransportEvent::Opened`] once the handshake completes
//! and [`TransportEvent::Closed`] exactly once when it ends for any reason.
//! Every event is tagged with the [`ConnectionId`] returned by `open`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ConnectionEvent, ConnectionId, Transport, TransportError, TransportEvent,
};

enum Outbound {
    Text(String),
    Close,
}

struct Connection {
    outbound: mpsc::UnboundedSender<Outbound>,
    cancel: CancellationToken,
}

/// Sends events for one connection.
struct EventSink {
    connection: ConnectionId,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl EventSink {
    fn emit(&self, event: TransportEvent) {
        if self
            .events
            .send(ConnectionEvent::new(self.connection, event))
            .is_err()
        {
            tracing::trace!(connection = %self.connection, "Transport event receiver dropped");
        }
    }
}

/// WebSocket connection to the streamer.
pub struct WebSocketTransport {
    url: String,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    connection: Mutex<Option<Connection>>,
    next_connection: AtomicU64,
}

impl WebSocketTransport {
    /// Create a transport for `url` that reports to `events`.
    #[must_use]
    pub fn new(url: impl Into<String>, events: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        Self {
            url: url.into(),
            events,
            connection: Mutex::new(None),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Create a transport along with the receiver for its events.
    #[must_use]
    pub fn with_channel(
        url: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(url, tx), rx)
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.url)
            .field("connected", &self.connection.lock().is_some())
            .finish()
    }
}

impl Transport for WebSocketTransport {
    fn open(&self) -> Result<ConnectionId, TransportError> {
        let mut connection = self.connection.lock();

        if connection
            .as_ref()
            .is_some_and(|conn| !conn.outbound.is_closed())
        {
            return Err(TransportError::AlreadyConnected);
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| TransportError::ConnectionFailed {
                message: e.to_string(),
            })?;

        let id = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        runtime.spawn(run_connection(
            self.url.clone(),
            outbound_rx,
            EventSink {
                connection: id,
                events: self.events.clone(),
            },
            cancel.clone(),
        ));

        *connection = Some(Connection {
            outbound: outbound_tx,
            cancel,
        });
        Ok(id)
    }

    fn send(&self, text: String) -> Result<(), TransportError> {
        let connection = self.connection.lock();
        let conn = connection.as_ref().ok_or(TransportError::NotConnected)?;

        conn.outbound
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::SendFailed {
                message: "connection task has ended".to_string(),
            })
    }

    fn close(&self, force: bool) {
        let Some(conn) = self.connection.lock().take() else {
            return;
        };

        if force {
            conn.cancel.cancel();
        } else if conn.outbound.send(Outbound::Close).is_err() {
            conn.cancel.cancel();
        }
    }
}

// =============================================================================
// Connection Task
// =============================================================================

async fn run_connection(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: EventSink,
    cancel: CancellationToken,
) {
    if let Err(e) = connect_and_run(&url, &mut outbound, &events, &cancel).await {
        tracing::warn!(
            url = %url,
            connection = %events.connection,
            error = %e,
            "Streamer connection ended with error"
        );
    }

    events.emit(TransportEvent::Closed);
}

async fn connect_and_run(
    url: &str,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
    events: &EventSink,
    cancel: &CancellationToken,
) -> Result<(), tungstenite::Error> {
    tracing::info!(url = %url, connection = %events.connection, "Connecting to streamer");

    let (ws_stream, _response) = tokio::select! {
        () = cancel.cancelled() => return Ok(()),
        result = tokio_tungstenite::connect_async(url) => result?,
    };

    let (mut write, mut read) = ws_stream.split();
    events.emit(TransportEvent::Opened);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("Connection cancelled");
                return Ok(());
            }
            out = outbound.recv() => {
                match out {
                    Some(Outbound::Text(text)) => {
                        write.send(Message::Text(text.into())).await?;
                    }
                    Some(Outbound::Close) | None => {
                        tracing::info!("Closing streamer connection");
                        write.send(Message::Close(None)).await?;
                        return Ok(());
                    }
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        events.emit(TransportEvent::Message(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Server sent close frame");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames are not used by the streamer
                    }
                    Some(Err(e)) => return Err(e),
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                }
            }
        }
    }
}

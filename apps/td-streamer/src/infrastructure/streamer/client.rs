//! Streamer Facade
//!
//! [`Streamer`] is the public surface of the adapter. It owns the request
//! builder, the dispatcher and, while connected, the authentication
//! controller. The caller drives it by feeding transport events into
//! [`Streamer::handle_connection_event`] and reads [`StreamerEvent`]s from
//! the channel returned by [`Streamer::new`]. Events from a connection other
//! than the one opened by the latest `connect` are dropped.
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut transport_rx) = WebSocketTransport::with_channel(session.socket_url());
//! let (mut streamer, mut events) =
//!     Streamer::new(session, Arc::new(UuidGenerator), Arc::new(transport));
//!
//! streamer.connect()?;
//! while let Some(event) = transport_rx.recv().await {
//!     streamer.handle_connection_event(event);
//! }
//! ```
//!
//! Requests are transmitted whether or not the session has authenticated.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use super::auth::AuthenticationController;
use super::codec::{CodecError, JsonCodec};
use super::dispatcher::{ResponseDispatcher, StreamerEvent};
use crate::application::ports::{
    ConnectionEvent, ConnectionId, IdGenerator, Transport, TransportError, TransportEvent,
};
use crate::domain::request::{
    ADMIN_SERVICE, CommandBatch, CommandSpec, QosError, QosLevel, RequestBatch, RequestBuilder,
    command,
};
use crate::domain::schema::{FieldSchemaRegistry, SchemaError, Service};
use crate::domain::session::SessionContext;
use crate::infrastructure::metrics;

// =============================================================================
// Error Type
// =============================================================================

/// Errors returned by streamer operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamerError {
    /// Unknown field or service. Nothing was sent.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Unknown QOS level. Nothing was sent.
    #[error(transparent)]
    Qos(#[from] QosError),

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The outbound message could not be encoded.
    #[error("encode error: {0}")]
    Codec(#[from] CodecError),
}

// =============================================================================
// Streamer
// =============================================================================

/// Streamer session facade.
pub struct Streamer {
    builder: RequestBuilder,
    registry: FieldSchemaRegistry,
    dispatcher: ResponseDispatcher,
    codec: JsonCodec,
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<StreamerEvent>,
    auth: Option<AuthenticationController>,
    connection: Option<ConnectionId>,
}

impl Streamer {
    /// Create a streamer and the receiver for its events.
    #[must_use]
    pub fn new(
        session: Arc<SessionContext>,
        ids: Arc<dyn IdGenerator>,
        transport: Arc<dyn Transport>,
    ) -> (Self, mpsc::UnboundedReceiver<StreamerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let registry = FieldSchemaRegistry::new();

        let streamer = Self {
            builder: RequestBuilder::new(session, ids),
            registry,
            dispatcher: ResponseDispatcher::new(registry),
            codec: JsonCodec::new(),
            transport,
            events,
            auth: None,
            connection: None,
        };

        (streamer, rx)
    }

    /// The session requests are stamped with.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        self.builder.session()
    }

    /// Whether the LOGIN handshake has succeeded on this connection.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth
            .as_ref()
            .is_some_and(AuthenticationController::is_authenticated)
    }

    /// The connection opened by the latest `connect`, while it is live.
    #[must_use]
    pub const fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    // -------------------------------------------------------------------------
    // Connection lifecycle
    // -------------------------------------------------------------------------

    /// Open the transport and start a new handshake. Returns the id of the
    /// new connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be opened.
    pub fn connect(&mut self) -> Result<ConnectionId, StreamerError> {
        let connection = self.transport.open()?;

        tracing::debug!(connection = %connection, "Streamer connecting");
        self.auth = Some(AuthenticationController::new());
        self.connection = Some(connection);
        Ok(connection)
    }

    /// Close the transport and stop dispatching.
    ///
    /// `force` skips the close handshake. Emits
    /// [`StreamerEvent::Disconnected`] if the streamer was connected.
    pub fn disconnect(&mut self, force: bool) {
        self.transport.close(force);
        self.auth = None;

        if let Some(connection) = self.connection.take() {
            tracing::info!(force, connection = %connection, "Streamer disconnected");
            self.emit(StreamerEvent::Disconnected);
        }
    }

    /// Process one event from any connection this streamer opened.
    ///
    /// Events from a connection other than the current one are dropped, so a
    /// late close of a replaced connection cannot end the new one.
    pub fn handle_connection_event(&mut self, event: ConnectionEvent) {
        if self.connection != Some(event.connection) {
            tracing::debug!(
                connection = %event.connection,
                event = ?event.event,
                "Dropping event from stale connection"
            );
            return;
        }

        self.handle_transport_event(event.event);
    }

    /// Process one event from the current connection.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.connection.is_none() {
            tracing::trace!(?event, "Ignoring transport event while disconnected");
            return;
        }

        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Message(text) => {
                for event in self.dispatcher.dispatch(&text, self.auth.as_mut()) {
                    self.emit(event);
                }
            }
            TransportEvent::Closed => self.on_closed(),
        }
    }

    fn on_open(&mut self) {
        let Some(auth) = self.auth.as_mut() else {
            return;
        };

        if let Some(login) = auth.on_transport_open(&self.builder)
            && let Err(e) = self.transmit(&login)
        {
            tracing::error!(error = %e, "Failed to send LOGIN");
        }
    }

    fn on_closed(&mut self) {
        if let Some(e) = self
            .auth
            .as_mut()
            .and_then(AuthenticationController::on_transport_closed)
        {
            tracing::error!(error = %e, "Streamer authentication failed");
            metrics::record_auth(metrics::AuthOutcome::Failure);
            self.emit(StreamerEvent::AuthenticationFailed(e));
        }

        tracing::info!("Streamer connection closed");
        self.auth = None;
        self.connection = None;
        self.emit(StreamerEvent::Disconnected);
    }

    fn emit(&self, event: StreamerEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }

    // -------------------------------------------------------------------------
    // Generic requests
    // -------------------------------------------------------------------------

    /// Build a request batch without sending it.
    pub fn create_request(&self, commands: impl Into<CommandBatch>) -> RequestBatch {
        self.builder.build(commands)
    }

    /// Send any serializable value as-is. Returns the text sent.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the transport fails.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<String, StreamerError> {
        let text = self.codec.encode(message)?;
        self.transport.send(text.clone())?;
        Ok(text)
    }

    fn transmit(&self, batch: &RequestBatch) -> Result<(), StreamerError> {
        self.send(batch)?;
        for request in &batch.requests {
            tracing::debug!(
                service = %request.service,
                command = %request.command,
                requestid = %request.requestid,
                "Request sent"
            );
            metrics::record_request_sent(&request.service, &request.command);
        }
        Ok(())
    }

    /// Build and send a request batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn send_request(
        &self,
        commands: impl Into<CommandBatch>,
    ) -> Result<RequestBatch, StreamerError> {
        let batch = self.builder.build(commands);
        self.transmit(&batch)?;
        Ok(batch)
    }

    /// Send commands as SUBS, whatever command they carry.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn subscribe(
        &self,
        commands: impl Into<CommandBatch>,
    ) -> Result<RequestBatch, StreamerError> {
        self.send_request(with_command(commands.into(), command::SUBS))
    }

    /// Send commands as UNSUBS, whatever command they carry.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubscribe(
        &self,
        commands: impl Into<CommandBatch>,
    ) -> Result<RequestBatch, StreamerError> {
        self.send_request(with_command(commands.into(), command::UNSUBS))
    }

    /// Change the server update frequency by level name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown level name, in which case nothing is
    /// sent, or if the transport fails.
    pub fn set_qos(&self, level: &str) -> Result<RequestBatch, StreamerError> {
        self.set_qos_level(level.parse()?)
    }

    /// Change the server update frequency.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn set_qos_level(&self, level: QosLevel) -> Result<RequestBatch, StreamerError> {
        self.send_request(
            CommandSpec::new(ADMIN_SERVICE, command::QOS).with_parameter("qoslevel", level.code()),
        )
    }

    // -------------------------------------------------------------------------
    // Service subscriptions
    // -------------------------------------------------------------------------

    fn subs_service<S: AsRef<str>>(
        &self,
        service: Service,
        keys: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        let fields = self.registry.indices_for(service.as_str(), fields)?;
        self.subscribe(
            CommandSpec::for_service(service.as_str())
                .with_parameter("keys", join_keys(keys))
                .with_parameter("fields", fields),
        )
    }

    fn unsubs_service<S: AsRef<str>>(
        &self,
        service: Service,
        keys: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubscribe(
            CommandSpec::for_service(service.as_str()).with_parameter("keys", join_keys(keys)),
        )
    }

    /// Subscribe to account activity for the session's subscription keys.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_account_activity(
        &self,
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        let keys = self.session().subscription_keys().to_vec();
        self.subs_service(Service::AcctActivity, &keys, fields)
    }

    /// Unsubscribe from account activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_account_activity(&self) -> Result<RequestBatch, StreamerError> {
        self.unsubscribe(CommandSpec::for_service(Service::AcctActivity.as_str()))
    }

    /// Subscribe to equity minute charts.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_chart_equity<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::ChartEquity, symbols, fields)
    }

    /// Unsubscribe from equity minute charts.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_chart_equity<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::ChartEquity, symbols)
    }

    /// Subscribe to futures minute charts.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_chart_futures<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::ChartFutures, symbols, fields)
    }

    /// Unsubscribe from futures minute charts.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_chart_futures<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::ChartFutures, symbols)
    }

    /// Subscribe to option minute charts.
    ///
    /// The streamer serves option charts on the `CHART_FUTURES` service, so
    /// the request goes out under that name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_chart_options<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::ChartFutures, symbols, fields)
    }

    /// Unsubscribe from option minute charts.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_chart_options<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::ChartFutures, symbols)
    }

    /// Subscribe to news headlines.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_news_headline<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::NewsHeadline, symbols, fields)
    }

    /// Unsubscribe from news headlines.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_news_headline<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::NewsHeadline, symbols)
    }

    /// Subscribe to equity time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_timesale_equity<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::TimesaleEquity, symbols, fields)
    }

    /// Unsubscribe from equity time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_timesale_equity<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::TimesaleEquity, symbols)
    }

    /// Subscribe to futures time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_timesale_futures<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::TimesaleFutures, symbols, fields)
    }

    /// Unsubscribe from futures time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_timesale_futures<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::TimesaleFutures, symbols)
    }

    /// Subscribe to options time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_timesale_options<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::TimesaleOptions, symbols, fields)
    }

    /// Unsubscribe from options time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_timesale_options<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::TimesaleOptions, symbols)
    }

    /// Subscribe to forex time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_timesale_forex<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::TimesaleForex, symbols, fields)
    }

    /// Unsubscribe from forex time & sales.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_timesale_forex<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::TimesaleForex, symbols)
    }

    /// Subscribe to level-one equity quotes.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_quote<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::Quote, symbols, fields)
    }

    /// Unsubscribe from level-one equity quotes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_quote<S: AsRef<str>>(&self, symbols: &[S]) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::Quote, symbols)
    }

    /// Subscribe to level-one futures quotes.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_levelone_futures<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::LevelOneFutures, symbols, fields)
    }

    /// Unsubscribe from level-one futures quotes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_levelone_futures<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::LevelOneFutures, symbols)
    }

    /// Subscribe to level-one forex quotes.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a transport failure.
    pub fn subs_levelone_forex<S: AsRef<str>>(
        &self,
        symbols: &[S],
        fields: Option<&[&str]>,
    ) -> Result<RequestBatch, StreamerError> {
        self.subs_service(Service::LevelOneForex, symbols, fields)
    }

    /// Unsubscribe from level-one forex quotes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn unsubs_levelone_forex<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> Result<RequestBatch, StreamerError> {
        self.unsubs_service(Service::LevelOneForex, symbols)
    }
}

impl std::fmt::Debug for Streamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streamer")
            .field("session", self.builder.session())
            .field("auth", &self.auth)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

fn with_command(mut batch: CommandBatch, name: &str) -> CommandBatch {
    for spec in batch.commands_mut() {
        spec.command = name.to_string();
    }
    batch
}

fn join_keys<S: AsRef<str>>(keys: &[S]) -> String {
    keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

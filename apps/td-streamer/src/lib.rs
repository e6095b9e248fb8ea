#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! TD Streamer - Streaming Market Data Protocol Adapter
//!
//! Client-side adapter for the TD Ameritrade streamer WebSocket API. It
//! authenticates a session, builds outbound request envelopes and turns the
//! streamer's array-indexed payloads into named records.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: protocol types and translation, no I/O
//!   - `schema`: per-service field tables and the name/index registry
//!   - `session`: principals bundle and session context
//!   - `request`: commands, envelopes, QOS levels
//!
//! - **Application**: port definitions
//!   - `ports`: `IdGenerator` and `Transport`
//!
//! - **Infrastructure**: adapters and ambient services
//!   - `streamer`: codec, LOGIN state machine, dispatcher, facade, WebSocket
//!   - `config`: environment configuration
//!   - `metrics`: Prometheus counters
//!   - `telemetry`: tracing subscriber and OTLP export
//!
//! # Data Flow
//!
//! ```text
//! caller --> Streamer --> RequestBuilder --> Transport --> streamer WS
//!                              |
//!                    FieldSchemaRegistry
//!                              |
//! caller <-- StreamerEvent <-- ResponseDispatcher <-- Transport <-- streamer WS
//!                              |
//!                  AuthenticationController
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Protocol types with no I/O.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters and ambient services.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::request::{
    CommandBatch, CommandSpec, Parameters, QosError, QosLevel, RequestBatch, RequestBuilder,
    RequestEnvelope,
};
pub use domain::schema::{
    EventCategory, FieldSchema, FieldSchemaRegistry, Record, SchemaError, Service,
};
pub use domain::session::{PrincipalsError, SessionContext, UserPrincipals};

// Ports
pub use application::ports::{
    ConnectionEvent, ConnectionId, IdGenerator, Transport, TransportError, TransportEvent,
};

// Streamer
pub use infrastructure::streamer::{
    AuthError, AuthState, AuthenticationController, ResponseDispatcher, Streamer, StreamerError,
    StreamerEvent, UuidGenerator, WebSocketTransport,
};

// Config
pub use infrastructure::config::{ConfigError, StreamerConfig};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};

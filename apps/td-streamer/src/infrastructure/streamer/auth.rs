//! Streamer Authentication
//!
//! Drives the LOGIN handshake for one connection.
//!
//! # Authentication Flow
//!
//! 1. Transport opens
//! 2. Send `ADMIN/LOGIN` with `{credential, token, version}`
//! 3. Receive `{"response":[{"service":"ADMIN","command":"LOGIN","content":{"code":0}}]}`
//!
//! Any other code, a missing code, or the connection closing first is a
//! failure. `Authenticated` and `Failed` are terminal for the connection.
//!
//! The controller never sends anything itself; it returns the LOGIN batch
//! and the outcome, and the streamer acts on them.

use thiserror::Error;

use super::messages::ResponseFrame;
use crate::domain::request::{ADMIN_SERVICE, CommandSpec, RequestBatch, RequestBuilder, command};

// =============================================================================
// Error Types
// =============================================================================

/// Reasons a LOGIN fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server answered with a non-zero code.
    #[error("login rejected ({code}): {message}")]
    Rejected {
        /// Code from the server.
        code: i64,
        /// Message from the server, empty if none.
        message: String,
    },

    /// The LOGIN response had no numeric code.
    #[error("login response carried no numeric code")]
    MissingCode,

    /// The connection closed before the LOGIN response.
    #[error("connection closed before login response")]
    ClosedBeforeResponse,
}

// =============================================================================
// Authentication State
// =============================================================================

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Waiting for the transport to open.
    #[default]
    Connecting,

    /// LOGIN sent, awaiting its response.
    AwaitingLoginResponse,

    /// LOGIN accepted.
    Authenticated,

    /// LOGIN rejected or connection lost.
    Failed,
}

impl AuthState {
    /// Check if authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Check if the handshake has finished either way.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed)
    }
}

// =============================================================================
// Authentication Controller
// =============================================================================

/// LOGIN state machine for a single connection.
#[derive(Debug, Default)]
pub struct AuthenticationController {
    state: AuthState,
}

impl AuthenticationController {
    /// Create a controller in the `Connecting` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AuthState::Connecting,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Check if authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Build the LOGIN request for the builder's session.
    #[must_use]
    pub fn login_request(builder: &RequestBuilder) -> RequestBatch {
        let session = builder.session();
        builder.build(
            CommandSpec::new(ADMIN_SERVICE, command::LOGIN)
                .with_parameter("credential", session.credential())
                .with_parameter("token", session.token())
                .with_parameter("version", session.version()),
        )
    }

    /// Called when the transport opens.
    ///
    /// Returns the LOGIN batch to send, or `None` if the handshake already
    /// started on this connection.
    pub fn on_transport_open(&mut self, builder: &RequestBuilder) -> Option<RequestBatch> {
        if self.state != AuthState::Connecting {
            tracing::warn!(state = ?self.state, "Transport opened outside Connecting, ignoring");
            return None;
        }

        self.state = AuthState::AwaitingLoginResponse;
        tracing::debug!("Sending LOGIN");
        Some(Self::login_request(builder))
    }

    /// Offer a response frame.
    ///
    /// Returns the handshake outcome if this frame completed it. Non-LOGIN
    /// frames and LOGIN frames outside `AwaitingLoginResponse` return `None`.
    pub fn on_response(&mut self, frame: &ResponseFrame) -> Option<Result<(), AuthError>> {
        if !frame.is_login() {
            return None;
        }

        if self.state != AuthState::AwaitingLoginResponse {
            tracing::debug!(state = ?self.state, "Ignoring LOGIN response");
            return None;
        }

        let outcome = match frame.code() {
            Some(0) => Ok(()),
            Some(code) => Err(AuthError::Rejected {
                code,
                message: frame.msg().unwrap_or_default().to_string(),
            }),
            None => Err(AuthError::MissingCode),
        };

        self.state = if outcome.is_ok() {
            AuthState::Authenticated
        } else {
            AuthState::Failed
        };

        Some(outcome)
    }

    /// Called when the transport closes.
    ///
    /// Returns a failure if the LOGIN response was still pending.
    pub fn on_transport_closed(&mut self) -> Option<AuthError> {
        if self.state == AuthState::AwaitingLoginResponse {
            self.state = AuthState::Failed;
            Some(AuthError::ClosedBeforeResponse)
        } else {
            None
        }
    }
}

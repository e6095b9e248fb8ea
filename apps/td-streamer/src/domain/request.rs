//! Request Envelopes
//!
//! Logical commands ([`CommandSpec`]) are turned into wire envelopes by the
//! [`RequestBuilder`], which stamps each one with a request id and the
//! session's account and source.
//!
//! # Wire Format
//!
//! ```json
//! {"requests":[{"requestid":"1","account":"123456789","source":"app",
//!               "service":"CHART_EQUITY","command":"SUBS",
//!               "parameters":{"keys":"SPY","fields":"0,1,2"}}]}
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::ports::IdGenerator;
use crate::domain::session::SessionContext;

/// Ordered request parameters.
pub type Parameters = Map<String, Value>;

/// Command names used by the streamer.
pub mod command {
    /// Add symbols to a subscription.
    pub const SUBS: &str = "SUBS";
    /// Remove symbols from a subscription.
    pub const UNSUBS: &str = "UNSUBS";
    /// Session login.
    pub const LOGIN: &str = "LOGIN";
    /// Session logout.
    pub const LOGOUT: &str = "LOGOUT";
    /// Quality-of-service change.
    pub const QOS: &str = "QOS";
}

/// Administrative service carrying LOGIN, LOGOUT and QOS.
pub const ADMIN_SERVICE: &str = "ADMIN";

// =============================================================================
// Commands
// =============================================================================

/// One logical command, before envelope fields are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Explicit request id. Generated when absent.
    pub requestid: Option<String>,
    /// Target service, e.g. `CHART_EQUITY`.
    pub service: String,
    /// Command, e.g. `SUBS`.
    pub command: String,
    /// Command parameters.
    pub parameters: Option<Parameters>,
}

impl CommandSpec {
    /// Create a command for a service.
    #[must_use]
    pub fn new(service: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            requestid: None,
            service: service.into(),
            command: command.into(),
            parameters: None,
        }
    }

    /// Create a command with only the service set. The facade fills the
    /// command in for SUBS/UNSUBS batches.
    #[must_use]
    pub fn for_service(service: impl Into<String>) -> Self {
        Self::new(service, String::new())
    }

    /// Use an explicit request id.
    #[must_use]
    pub fn with_request_id(mut self, requestid: impl Into<String>) -> Self {
        self.requestid = Some(requestid.into());
        self
    }

    /// Set the command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Add one parameter, keeping insertion order.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace all parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// One or more commands destined for a single batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBatch(Vec<CommandSpec>);

impl CommandBatch {
    /// Commands in submission order.
    #[must_use]
    pub fn commands(&self) -> &[CommandSpec] {
        &self.0
    }

    /// Mutable access, used to force a command name.
    pub fn commands_mut(&mut self) -> &mut [CommandSpec] {
        &mut self.0
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<CommandSpec> for CommandBatch {
    fn from(spec: CommandSpec) -> Self {
        Self(vec![spec])
    }
}

impl From<Vec<CommandSpec>> for CommandBatch {
    fn from(specs: Vec<CommandSpec>) -> Self {
        Self(specs)
    }
}

impl<const N: usize> From<[CommandSpec; N]> for CommandBatch {
    fn from(specs: [CommandSpec; N]) -> Self {
        Self(specs.into())
    }
}

impl IntoIterator for CommandBatch {
    type Item = CommandSpec;
    type IntoIter = std::vec::IntoIter<CommandSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// A fully populated request as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Request id.
    pub requestid: String,
    /// Account number.
    pub account: String,
    /// Application id.
    pub source: String,
    /// Target service.
    pub service: String,
    /// Command.
    pub command: String,
    /// Parameters, omitted when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// The outbound wire message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBatch {
    /// Envelopes in submission order.
    pub requests: Vec<RequestEnvelope>,
}

impl RequestBatch {
    /// Request ids in order.
    #[must_use]
    pub fn request_ids(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.requestid.as_str()).collect()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds request batches for a session.
#[derive(Clone)]
pub struct RequestBuilder {
    session: Arc<SessionContext>,
    ids: Arc<dyn IdGenerator>,
}

impl RequestBuilder {
    /// Create a builder.
    #[must_use]
    pub fn new(session: Arc<SessionContext>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { session, ids }
    }

    /// The session envelopes are stamped with.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Build one envelope per command, in order.
    ///
    /// A command's own request id wins; otherwise the id generator is called
    /// once for that envelope. Empty parameter maps are left off.
    pub fn build(&self, commands: impl Into<CommandBatch>) -> RequestBatch {
        let requests = commands
            .into()
            .into_iter()
            .map(|spec| RequestEnvelope {
                requestid: spec.requestid.unwrap_or_else(|| self.ids.next_id()),
                account: self.session.account_id().to_string(),
                source: self.session.source().to_string(),
                service: spec.service,
                command: spec.command,
                parameters: spec.parameters.filter(|p| !p.is_empty()),
            })
            .collect();

        RequestBatch { requests }
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Quality of Service
// =============================================================================

/// Unknown QOS level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown QOS level '{0}'")]
pub struct QosError(pub String);

/// Server-side update frequency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QosLevel {
    /// 500 ms.
    Express,
    /// 750 ms.
    #[default]
    Realtime,
    /// 1,000 ms.
    Fast,
    /// 1,500 ms.
    Moderate,
    /// 3,000 ms.
    Slow,
    /// 5,000 ms.
    Delayed,
}

impl QosLevel {
    /// Numeric level sent as `qoslevel`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Express => 0,
            Self::Realtime => 1,
            Self::Fast => 2,
            Self::Moderate => 3,
            Self::Slow => 4,
            Self::Delayed => 5,
        }
    }

    /// Lower-case level name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Realtime => "realtime",
            Self::Fast => "fast",
            Self::Moderate => "moderate",
            Self::Slow => "slow",
            Self::Delayed => "delayed",
        }
    }
}

impl fmt::Display for QosLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QosLevel {
    type Err = QosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "express" => Ok(Self::Express),
            "realtime" => Ok(Self::Realtime),
            "fast" => Ok(Self::Fast),
            "moderate" => Ok(Self::Moderate),
            "slow" => Ok(Self::Slow),
            "delayed" => Ok(Self::Delayed),
            _ => Err(QosError(s.to_string())),
        }
    }
}

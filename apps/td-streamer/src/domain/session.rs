//! Streamer Session Context
//!
//! The vendor hands out streamer credentials as a "user principals" bundle.
//! [`SessionContext`] is the immutable, validated view of that bundle that
//! every request envelope and the LOGIN handshake read from.
//!
//! # LOGIN credential
//!
//! The LOGIN request carries a URL-encoded query string with a fixed field
//! order:
//!
//! ```text
//! userid=..&token=..&company=..&segment=..&cddomain=..&usergroup=..
//!   &accesslevel=..&authorized=Y&timestamp=..&appid=..&acl=..
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Protocol version sent with LOGIN.
pub const SCHEMA_VERSION: &str = "1.0";

// =============================================================================
// Error Types
// =============================================================================

/// Errors building a session from a principals bundle.
#[derive(Debug, Error)]
pub enum PrincipalsError {
    /// The bundle could not be parsed.
    #[error("invalid principals JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The bundle file could not be read.
    #[error("failed to read principals file: {0}")]
    Io(#[from] std::io::Error),

    /// The bundle lists no accounts.
    #[error("principals contain no accounts")]
    NoAccount,

    /// The token timestamp is not a recognizable date-time.
    #[error("invalid token timestamp '{0}'")]
    InvalidTimestamp(String),
}

// =============================================================================
// Principals Bundle
// =============================================================================

/// User principals as returned by the vendor's account API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPrincipals {
    /// Accounts the user can stream for. The first one is used.
    pub accounts: Vec<PrincipalAccount>,
    /// Streamer connection credentials.
    pub streamer_info: StreamerInfo,
    /// Keys for account-activity subscriptions.
    #[serde(default)]
    pub streamer_subscription_keys: SubscriptionKeys,
}

/// Account entry in the principals bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalAccount {
    /// Account number.
    pub account_id: String,
    /// Company code.
    pub company: String,
    /// Segment code.
    pub segment: String,
    /// CD domain identifier.
    pub account_cd_domain_id: String,
}

/// Streamer section of the principals bundle.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamerInfo {
    /// Host of the streamer WebSocket endpoint.
    pub streamer_socket_url: String,
    /// Streamer token.
    pub token: String,
    /// When the token was issued.
    pub token_timestamp: String,
    /// User group.
    pub user_group: String,
    /// Access level.
    pub access_level: String,
    /// Access control list.
    pub acl: String,
    /// Application id, used as the request `source`.
    pub app_id: String,
}

impl std::fmt::Debug for StreamerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamerInfo")
            .field("streamer_socket_url", &self.streamer_socket_url)
            .field("token", &"[REDACTED]")
            .field("token_timestamp", &self.token_timestamp)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// Subscription key list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionKeys {
    /// Keys, in vendor order.
    #[serde(default)]
    pub keys: Vec<SubscriptionKey>,
}

/// One subscription key.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionKey {
    /// Opaque key value.
    pub key: String,
}

impl UserPrincipals {
    /// Parse a principals bundle from JSON text.
    pub fn from_json(text: &str) -> Result<Self, PrincipalsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a principals bundle from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PrincipalsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

// =============================================================================
// Session Context
// =============================================================================

/// Read-only session data shared by every component for the lifetime of a
/// connection.
#[derive(Clone)]
pub struct SessionContext {
    account_id: String,
    source: String,
    token: String,
    token_timestamp: DateTime<Utc>,
    company: String,
    segment: String,
    cd_domain: String,
    user_group: String,
    access_level: String,
    acl: String,
    subscription_keys: Vec<String>,
    socket_host: String,
}

impl SessionContext {
    /// Build the session from a principals bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle has no account or the token timestamp
    /// cannot be parsed.
    pub fn from_principals(principals: &UserPrincipals) -> Result<Self, PrincipalsError> {
        let account = principals
            .accounts
            .first()
            .ok_or(PrincipalsError::NoAccount)?;
        let info = &principals.streamer_info;

        Ok(Self {
            account_id: account.account_id.clone(),
            source: info.app_id.clone(),
            token: info.token.clone(),
            token_timestamp: parse_token_timestamp(&info.token_timestamp)?,
            company: account.company.clone(),
            segment: account.segment.clone(),
            cd_domain: account.account_cd_domain_id.clone(),
            user_group: info.user_group.clone(),
            access_level: info.access_level.clone(),
            acl: info.acl.clone(),
            subscription_keys: principals
                .streamer_subscription_keys
                .keys
                .iter()
                .map(|k| k.key.clone())
                .collect(),
            socket_host: info.streamer_socket_url.clone(),
        })
    }

    /// Account number injected into every envelope.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Application id injected into every envelope as `source`.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Streamer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Protocol version.
    #[must_use]
    pub const fn version(&self) -> &'static str {
        SCHEMA_VERSION
    }

    /// Account-activity subscription keys.
    #[must_use]
    pub fn subscription_keys(&self) -> &[String] {
        &self.subscription_keys
    }

    /// Default WebSocket URL for this session.
    #[must_use]
    pub fn socket_url(&self) -> String {
        format!("wss://{}/ws", self.socket_host)
    }

    /// Build the URL-encoded LOGIN credential string.
    ///
    /// The timestamp is derived from the token timestamp on every call.
    #[must_use]
    pub fn credential(&self) -> String {
        let timestamp = self.token_timestamp.timestamp_millis().to_string();

        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("userid", &self.account_id)
            .append_pair("token", &self.token)
            .append_pair("company", &self.company)
            .append_pair("segment", &self.segment)
            .append_pair("cddomain", &self.cd_domain)
            .append_pair("usergroup", &self.user_group)
            .append_pair("accesslevel", &self.access_level)
            .append_pair("authorized", "Y")
            .append_pair("timestamp", &timestamp)
            .append_pair("appid", &self.source)
            .append_pair("acl", &self.acl)
            .finish()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("account_id", &self.account_id)
            .field("source", &self.source)
            .field("token", &"[REDACTED]")
            .field("token_timestamp", &self.token_timestamp)
            .field("socket_host", &self.socket_host)
            .finish_non_exhaustive()
    }
}

/// Token timestamps come as `2020-01-01T00:00:00+0000`; RFC 3339 is also
/// accepted.
fn parse_token_timestamp(raw: &str) -> Result<DateTime<Utc>, PrincipalsError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| PrincipalsError::InvalidTimestamp(raw.to_string()))
}

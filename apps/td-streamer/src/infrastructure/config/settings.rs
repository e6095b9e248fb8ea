use std::path::PathBuf;

use crate::domain::request::QosLevel;

/// Default Prometheus listener port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Streamer binary configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamerConfig {
    /// JSON file holding the user principals bundle.
    pub principals_path: PathBuf,
    /// WebSocket URL override. The session's socket URL is used otherwise.
    pub streamer_url: Option<String>,
    /// QOS level requested after login.
    pub qos: QosLevel,
    /// Symbols subscribed after login.
    pub symbols: Vec<String>,
    /// Prometheus listener port, `0` disables metrics.
    pub metrics_port: u16,
}

impl StreamerConfig {
    /// Create configuration from environment variables.
    ///
    /// - `TD_PRINCIPALS_PATH` (required)
    /// - `TD_STREAMER_URL`
    /// - `TD_QOS` (default `realtime`)
    /// - `TD_SYMBOLS` (default `SPY`, comma-separated)
    /// - `TD_STREAMER_METRICS_PORT` (default 9090)
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StreamerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let principals_path = lookup("TD_PRINCIPALS_PATH")
            .ok_or_else(|| ConfigError::MissingEnvVar("TD_PRINCIPALS_PATH".to_string()))?;

        if principals_path.trim().is_empty() {
            return Err(ConfigError::EmptyValue("TD_PRINCIPALS_PATH".to_string()));
        }

        let streamer_url = lookup("TD_STREAMER_URL").filter(|url| !url.trim().is_empty());

        let qos = match lookup("TD_QOS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TD_QOS".to_string(),
                value: raw,
            })?,
            None => QosLevel::default(),
        };

        let symbols = lookup("TD_SYMBOLS").map_or_else(
            || vec!["SPY".to_string()],
            |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_uppercase)
                    .collect()
            },
        );

        let metrics_port = parse_u16(&lookup, "TD_STREAMER_METRICS_PORT", DEFAULT_METRICS_PORT);

        Ok(Self {
            principals_path: PathBuf::from(principals_path),
            streamer_url,
            qos,
            symbols,
            metrics_port,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has a value that cannot be parsed.
    #[error("invalid value '{value}' for environment variable {key}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn parse_u16(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u16) -> u16 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config =
            StreamerConfig::from_lookup(lookup(&[("TD_PRINCIPALS_PATH", "principals.json")]))
                .unwrap();

        assert_eq!(config.principals_path, PathBuf::from("principals.json"));
        assert_eq!(config.streamer_url, None);
        assert_eq!(config.qos, QosLevel::Realtime);
        assert_eq!(config.symbols, ["SPY"]);
        assert_eq!(config.metrics_port, 9090);
    }

    #[test]
    fn overrides_apply() {
        let config = StreamerConfig::from_lookup(lookup(&[
            ("TD_PRINCIPALS_PATH", "p.json"),
            ("TD_STREAMER_URL", "ws://localhost:8080/ws"),
            ("TD_QOS", "slow"),
            ("TD_SYMBOLS", "spy, qqq,,/ES"),
            ("TD_STREAMER_METRICS_PORT", "0"),
        ]))
        .unwrap();

        assert_eq!(config.streamer_url.as_deref(), Some("ws://localhost:8080/ws"));
        assert_eq!(config.qos, QosLevel::Slow);
        assert_eq!(config.symbols, ["SPY", "QQQ", "/ES"]);
        assert_eq!(config.metrics_port, 0);
    }

    #[test]
    fn missing_principals_path() {
        assert!(matches!(
            StreamerConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingEnvVar(key)) if key == "TD_PRINCIPALS_PATH"
        ));
    }

    #[test]
    fn empty_principals_path() {
        assert!(matches!(
            StreamerConfig::from_lookup(lookup(&[("TD_PRINCIPALS_PATH", "  ")])),
            Err(ConfigError::EmptyValue(_))
        ));
    }

    #[test]
    fn invalid_qos() {
        assert!(matches!(
            StreamerConfig::from_lookup(lookup(&[
                ("TD_PRINCIPALS_PATH", "p.json"),
                ("TD_QOS", "warp"),
            ])),
            Err(ConfigError::InvalidValue { key, .. }) if key == "TD_QOS"
        ));
    }

    #[test]
    fn unparseable_port_falls_back() {
        let config = StreamerConfig::from_lookup(lookup(&[
            ("TD_PRINCIPALS_PATH", "p.json"),
            ("TD_STREAMER_METRICS_PORT", "http"),
        ]))
        .unwrap();
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
    }
}

//! Relay configuration module
//!
//! Configuration is assembled in three layers:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file named by `TEAMHUB_CONFIG`
//! 3. Environment variable overrides (`SERVER_HOST`, `SERVER_PORT`,
//!    `BROKER_URL`, `JWT_SECRET`, `MEMBERSHIP_MODE`, `DATABASE_URL`,
//!    `CLIENT_URL`)
//!
//! The result is validated before the server starts. Tests build
//! configurations directly through [`RelayConfig::builder`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::shared::backoff::BackoffConfig;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "TEAMHUB_CONFIG";

/// Broker URL selecting the in-process broker
pub const MEMORY_BROKER_URL: &str = "memory";

/// Longest accepted ping interval
pub const MAX_PING_INTERVAL_SECS: u64 = 3600;

/// How join requests are checked against team membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipMode {
    /// Admit any team id the authenticated client claims
    #[default]
    Trust,
    /// Admit only the team carried in the session token
    Claims,
    /// Check the `team_members` table before admitting
    Database,
}

impl FromStr for MembershipMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "claims" => Ok(Self::Claims),
            "database" | "db" => Ok(Self::Database),
            other => Err(ConfigError::InvalidValue {
                key: "membership_mode",
                message: format!("unknown mode '{}'", other),
            }),
        }
    }
}

/// Relay server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// `memory` or a `nats://` URL
    pub broker_url: String,
    /// HS256 secret used to verify session tokens
    pub jwt_secret: String,
    /// Join-time membership policy
    pub membership_mode: MembershipMode,
    /// PostgreSQL URL, required for `MembershipMode::Database`
    pub database_url: Option<String>,
    /// Allowed CORS origin; any origin when unset
    pub client_url: Option<String>,
    /// Outbound frames queued per connection before frames are dropped
    pub connection_buffer: usize,
    /// Seconds between pings on idle connections
    pub ping_interval_secs: u64,
    /// Broker reconnect policy
    pub reconnect: BackoffConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            broker_url: MEMORY_BROKER_URL.to_string(),
            jwt_secret: String::new(),
            membership_mode: MembershipMode::Trust,
            database_url: None,
            client_url: None,
            connection_buffer: 256,
            ping_interval_secs: 25,
            reconnect: BackoffConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Create a new RelayConfigBuilder
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Load from the optional config file and the environment, then validate
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse TOML text; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "port",
                message: format!("'{}' is not a port number", port),
            })?;
        }
        if let Some(url) = lookup("BROKER_URL") {
            self.broker_url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(mode) = lookup("MEMBERSHIP_MODE") {
            self.membership_mode = mode.parse()?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(url) = lookup("CLIENT_URL") {
            self.client_url = Some(url);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("jwt_secret"));
        }
        if self.broker_url != MEMORY_BROKER_URL && !self.broker_url.starts_with("nats://") {
            return Err(ConfigError::InvalidUrl(self.broker_url.clone()));
        }
        if self.membership_mode == MembershipMode::Database && self.database_url.is_none() {
            return Err(ConfigError::MissingValue("database_url"));
        }
        if self.connection_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "connection_buffer",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.ping_interval_secs == 0 || self.ping_interval_secs > MAX_PING_INTERVAL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "ping_interval_secs",
                message: format!("must be between 1 and {}", MAX_PING_INTERVAL_SECS),
            });
        }
        self.reconnect.validate()?;
        Ok(())
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the in-process broker is selected
    pub fn uses_memory_broker(&self) -> bool {
        self.broker_url == MEMORY_BROKER_URL
    }
}

/// Builder for RelayConfig
#[derive(Debug, Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the broker URL
    pub fn broker_url(mut self, url: impl Into<String>) -> Self {
        self.config.broker_url = url.into();
        self
    }

    /// Set the JWT secret
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    /// Set the membership mode
    pub fn membership_mode(mut self, mode: MembershipMode) -> Self {
        self.config.membership_mode = mode;
        self
    }

    /// Set the database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    /// Set the allowed CORS origin
    pub fn client_url(mut self, url: impl Into<String>) -> Self {
        self.config.client_url = Some(url.into());
        self
    }

    /// Set the per-connection queue capacity
    pub fn connection_buffer(mut self, capacity: usize) -> Self {
        self.config.connection_buffer = capacity;
        self
    }

    /// Set the ping interval
    pub fn ping_interval_secs(mut self, secs: u64) -> Self {
        self.config.ping_interval_secs = secs;
        self
    }

    /// Set the broker reconnect policy
    pub fn reconnect(mut self, backoff: BackoffConfig) -> Self {
        self.config.reconnect = backoff;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RelayConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("cannot read config file {path}: {message}")]
    Io { path: String, message: String },
    #[error("cannot parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use std::collections::HashMap;

    #[test]
    fn test_builder_requires_secret() {
        let result = RelayConfig::builder().build();
        assert_matches!(result, Err(ConfigError::MissingValue("jwt_secret")));

        let config = RelayConfig::builder().jwt_secret("s3cret").port(0).build().unwrap();
        assert_eq!(config.port, 0);
        assert!(config.uses_memory_broker());
    }

    #[test]
    fn test_database_mode_requires_url() {
        let result = RelayConfig::builder()
            .jwt_secret("s3cret")
            .membership_mode(MembershipMode::Database)
            .build();
        assert_matches!(result, Err(ConfigError::MissingValue("database_url")));
    }

    #[test]
    fn test_rejects_unknown_broker_scheme() {
        let result = RelayConfig::builder()
            .jwt_secret("s3cret")
            .broker_url("redis://localhost:6379")
            .build();
        assert_matches!(result, Err(ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn test_from_toml_keeps_defaults() {
        let config = RelayConfig::from_toml_str(
            r#"
            port = 7000
            jwt_secret = "abc"
            membership_mode = "claims"

            [reconnect]
            max_delay_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.membership_mode, MembershipMode::Claims);
        assert_eq!(config.reconnect.max_delay_ms, 5000);
        assert_eq!(config.reconnect.initial_delay_ms, 500);
        assert_eq!(config.connection_buffer, 256);
    }

    #[test]
    fn test_rejects_reconnect_policy_without_pause() {
        let result = RelayConfig::from_toml_str(
            r#"
            jwt_secret = "abc"

            [reconnect]
            initial_delay_ms = 0
            "#,
        )
        .unwrap()
        .validate();
        assert_matches!(
            result,
            Err(ConfigError::InvalidValue { key: "reconnect.initial_delay_ms", .. })
        );
    }

    #[test]
    fn test_rejects_nan_reconnect_jitter() {
        let result = RelayConfig::from_toml_str(
            r#"
            jwt_secret = "abc"

            [reconnect]
            jitter_factor = nan
            "#,
        )
        .unwrap()
        .validate();
        assert_matches!(
            result,
            Err(ConfigError::InvalidValue { key: "reconnect.jitter_factor", .. })
        );
    }

    #[test]
    fn test_rejects_out_of_range_ping_interval() {
        for secs in [0, MAX_PING_INTERVAL_SECS + 1, u64::MAX] {
            let result = RelayConfig::builder()
                .jwt_secret("s3cret")
                .ping_interval_secs(secs)
                .build();
            assert_matches!(
                result,
                Err(ConfigError::InvalidValue { key: "ping_interval_secs", .. })
            );
        }
        assert!(RelayConfig::builder()
            .jwt_secret("s3cret")
            .ping_interval_secs(MAX_PING_INTERVAL_SECS)
            .build()
            .is_ok());
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SERVER_PORT", "8080"),
            ("BROKER_URL", "nats://localhost:4222"),
            ("MEMBERSHIP_MODE", "database"),
            ("DATABASE_URL", "postgres://localhost/teamhub"),
        ]
        .into_iter()
        .collect();

        let mut config = RelayConfig::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.broker_url, "nats://localhost:4222");
        assert_eq!(config.membership_mode, MembershipMode::Database);
        assert!(!config.uses_memory_broker());
    }

    #[test]
    fn test_apply_env_rejects_bad_port() {
        let mut config = RelayConfig::default();
        let result = config.apply_env(|key| (key == "SERVER_PORT").then(|| "http".to_string()));
        assert_matches!(result, Err(ConfigError::InvalidValue { key: "port", .. }));
    }

    #[test]
    #[serial]
    fn test_load_from_process_env() {
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::set_var("JWT_SECRET", "from-env");
        std::env::set_var("SERVER_PORT", "5055");

        let config = RelayConfig::load().unwrap();
        assert_eq!(config.jwt_secret, "from-env");
        assert_eq!(config.port, 5055);

        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("SERVER_PORT");
    }
}

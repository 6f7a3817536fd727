//! Settings and credentials for the sentinel binary.
//!
//! Tunables live in a TOML file; the player's credentials come from the
//! environment (optionally seeded from a `.env` file) so they never end up in
//! the settings file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use watch_core::WatchSettings;

pub const ENV_SERVER_IP: &str = "SENTINEL_SERVER_IP";
pub const ENV_SERVER_PORT: &str = "SENTINEL_SERVER_PORT";
pub const ENV_PLAYER_ID: &str = "SENTINEL_PLAYER_ID";
pub const ENV_PLAYER_TOKEN: &str = "SENTINEL_PLAYER_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("Environment variable {var} has an invalid value: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

/// Application settings loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Loop timing, all in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    #[serde(default = "default_broadcast_interval")]
    pub broadcast_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    10
}

fn default_error_backoff() -> u64 {
    5
}

fn default_broadcast_interval() -> u64 {
    900
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            error_backoff_secs: default_error_backoff(),
            broadcast_interval_secs: default_broadcast_interval(),
        }
    }
}

impl WatchConfig {
    pub fn to_settings(&self) -> WatchSettings {
        WatchSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            broadcast_interval: Duration::from_secs(self.broadcast_interval_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Upper bound for one companion request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ConnectionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads settings from `path`, writing the defaults there first if the
    /// file does not exist.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            Ok(toml::from_str(&content)?)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("watch.poll_interval_secs", self.watch.poll_interval_secs),
            ("watch.error_backoff_secs", self.watch.error_backoff_secs),
            ("watch.broadcast_interval_secs", self.watch.broadcast_interval_secs),
            ("connection.request_timeout_secs", self.connection.request_timeout_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{} must be greater than zero", name)));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                self.logging.level
            )));
        }

        Ok(())
    }
}

/// Companion credentials for the observing player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub server_ip: String,
    pub server_port: u16,
    pub player_id: u64,
    pub player_token: i64,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads every variable through `lookup`, so callers other than the
    /// process environment can supply values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_ip = required(&lookup, ENV_SERVER_IP)?;
        if server_ip.trim().is_empty() {
            return Err(ConfigError::InvalidVar { var: ENV_SERVER_IP, value: server_ip });
        }

        Ok(Self {
            server_ip,
            server_port: parsed(&lookup, ENV_SERVER_PORT)?,
            player_id: parsed(&lookup, ENV_PLAYER_ID)?,
            player_token: parsed(&lookup, ENV_PLAYER_TOKEN)?,
        })
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).ok_or(ConfigError::MissingVar(var))
}

fn parsed<T, F>(lookup: &F, var: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = required(lookup, var)?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidVar { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::{tempdir, NamedTempFile};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            (ENV_SERVER_IP, "203.0.113.7"),
            (ENV_SERVER_PORT, "28082"),
            (ENV_PLAYER_ID, "76561198000000001"),
            (ENV_PLAYER_TOKEN, "-123456"),
        ])
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.watch.poll_interval_secs, 10);
        assert_eq!(config.watch.error_backoff_secs, 5);
        assert_eq!(config.watch.broadcast_interval_secs, 900);
        assert_eq!(config.connection.request_timeout_secs, 10);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
        assert_eq!(config.watch.to_settings(), WatchSettings::default());
    }

    #[test]
    fn test_validation_rejects_zero_intervals() {
        let mut config = AppConfig::default();
        config.watch.poll_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch.poll_interval_secs"));

        let mut config = AppConfig::default();
        config.connection.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_load_from_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let toml_content = r#"
[watch]
poll_interval_secs = 3

[logging]
level = "debug"
json_format = true
"#;
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.watch.poll_interval_secs, 3);
        assert_eq!(config.watch.broadcast_interval_secs, 900);
        assert_eq!(config.connection.request_timeout_secs, 10);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "[watch\npoll").await.unwrap();

        let result = AppConfig::load_from_file(temp_file.path()).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let vars = full_env();
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.server_ip, "203.0.113.7");
        assert_eq!(creds.server_port, 28082);
        assert_eq!(creds.player_id, 76561198000000001);
        assert_eq!(creds.player_token, -123456);
    }

    #[test]
    fn test_missing_credential_names_variable() {
        let mut vars = full_env();
        vars.remove(ENV_PLAYER_TOKEN);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_PLAYER_TOKEN)));
        assert!(err.to_string().contains("SENTINEL_PLAYER_TOKEN"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = full_env();
        vars.insert(ENV_SERVER_PORT.to_string(), "99999".to_string());
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { var: ENV_SERVER_PORT, .. }));
    }
}

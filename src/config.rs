//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Warehouse (BigQuery) connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Project the client is bound to; jobs are billed here
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Fully qualified table of block records
    #[serde(default = "default_blocks_table")]
    pub blocks_table: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Static OAuth bearer token. Falls back to the metadata server when unset.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Job location (e.g. "US"), required by some datasets when polling
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long the server may hold a `queries` call open before answering
    #[serde(default = "default_job_timeout")]
    pub job_timeout_ms: u64,

    /// Delay between polls of an incomplete job
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_project_id() -> String {
    "telegram-bot-361314".to_string()
}

fn default_blocks_table() -> String {
    "bigquery-public-data.crypto_ethereum.blocks".to_string()
}

fn default_api_base_url() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_job_timeout() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            blocks_table: default_blocks_table(),
            api_base_url: default_api_base_url(),
            access_token: None,
            location: None,
            request_timeout_secs: default_request_timeout(),
            job_timeout_ms: default_job_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Shortest accepted auto-refresh interval
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Dashboard presentation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// Delay between render cycles while auto-refresh is on. Must be at
    /// least one second.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_title() -> String {
    "Ethereum Blocks Real-Time (Demo)".to_string()
}

fn default_refresh_interval() -> u64 {
    10
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl DashboardConfig {
    /// Refresh delay, never shorter than [`MIN_REFRESH_INTERVAL`]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs).max(MIN_REFRESH_INTERVAL)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of concurrent dashboard sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` wins over the configured level when set.
    pub fn init(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("blockwatch={},tower_http=debug", self.level))
        });

        let registry = tracing_subscriber::registry().with(filter);
        if self.format == "json" {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "dashboard.refresh_interval_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("blockwatch").join("config.toml")),
            Some(PathBuf::from("/etc/blockwatch/config.toml")),
            Some(PathBuf::from("./blockwatch.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Warehouse overrides
        if let Ok(project) = std::env::var("BLOCKWATCH_PROJECT") {
            self.warehouse.project_id = project;
        }
        if let Ok(table) = std::env::var("BLOCKWATCH_TABLE") {
            self.warehouse.blocks_table = table;
        }
        if let Ok(token) = std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.warehouse.access_token = Some(token);
            }
        }

        // Dashboard overrides
        if let Ok(secs) = std::env::var("BLOCKWATCH_REFRESH_SECS") {
            match secs.parse::<u64>() {
                Ok(s) if s > 0 => self.dashboard.refresh_interval_secs = s,
                _ => tracing::warn!(
                    value = %secs,
                    "Ignoring BLOCKWATCH_REFRESH_SECS, expected a whole number of seconds >= 1"
                ),
            }
        }

        // Server overrides
        if let Ok(host) = std::env::var("BLOCKWATCH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BLOCKWATCH_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("BLOCKWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("BLOCKWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Blockwatch Configuration
#
# Environment variables override these settings:
# - BLOCKWATCH_PROJECT
# - BLOCKWATCH_TABLE
# - BLOCKWATCH_REFRESH_SECS
# - BLOCKWATCH_HOST
# - BLOCKWATCH_PORT
# - BLOCKWATCH_LOG_LEVEL
# - BLOCKWATCH_LOG_FORMAT
# - GOOGLE_OAUTH_ACCESS_TOKEN

[warehouse]
# Project queries are billed to
project_id = "telegram-bot-361314"

# Table holding one row per mined block
blocks_table = "bigquery-public-data.crypto_ethereum.blocks"

# BigQuery REST endpoint
api_base_url = "https://bigquery.googleapis.com/bigquery/v2"

# OAuth bearer token (omit to use the GCE metadata server)
# access_token = ""

# Job location, if the dataset requires one
# location = "US"

# HTTP request timeout in seconds
request_timeout_secs = 30

# Server-side wait for a query before it answers "not complete" (ms)
job_timeout_ms = 10000

# Delay between polls of a running job (ms)
poll_interval_ms = 1000

[dashboard]
title = "Ethereum Blocks Real-Time (Demo)"

# Seconds between refreshes while auto-refresh is on
refresh_interval_secs = 10

[server]
host = "0.0.0.0"
port = 8501

# Maximum concurrent dashboard sessions
max_sessions = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.warehouse.project_id, "telegram-bot-361314");
        assert_eq!(
            config.warehouse.blocks_table,
            "bigquery-public-data.crypto_ethereum.blocks"
        );
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.server.addr(), "0.0.0.0:8501");
        assert!(config.warehouse.access_token.is_none());
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.warehouse.project_id, "telegram-bot-361314");
        assert_eq!(config.dashboard.refresh_interval_secs, 10);
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dashboard]\nrefresh_interval_secs = 3\n\n[server]\nport = 9000").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.dashboard.refresh_interval_secs, 3);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.warehouse.project_id, "telegram-bot-361314");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_rejects_zero_refresh_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dashboard]\nrefresh_interval_secs = 0").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "dashboard.refresh_interval_secs", .. })
        ));
    }

    #[test]
    fn test_refresh_interval_has_floor() {
        let config: DashboardConfig = toml::from_str("refresh_interval_secs = 0").unwrap();
        assert_eq!(config.refresh_interval(), MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}

//! Configuration module for Krepsys.

use serde::Deserialize;
use std::path::Path;

use crate::{KrepsysError, Result};

/// Minimum allowed per-feed fetch interval in seconds.
pub const MIN_FETCH_INTERVAL_SECS: u64 = 60;

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/krepsys.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Default fetch interval for newly created feeds, in seconds.
    #[serde(default = "default_fetch_interval")]
    pub default_interval_secs: u64,
    /// Scheduler tick interval in seconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Maximum feed document size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_fetch_interval() -> u64 {
    900 // 15 minutes
}

fn default_tick_interval() -> u64 {
    60
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: default_fetch_interval(),
            tick_interval_secs: default_tick_interval(),
            max_feed_size_bytes: default_max_feed_size(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/krepsys.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(KrepsysError::Io)?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| KrepsysError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The default fetch interval is below the minimum
    /// - The scheduler tick interval is zero
    pub fn validate(&self) -> Result<()> {
        if self.fetch.default_interval_secs < MIN_FETCH_INTERVAL_SECS {
            return Err(KrepsysError::Config(format!(
                "default_interval_secs must be at least {} (got {})",
                MIN_FETCH_INTERVAL_SECS, self.fetch.default_interval_secs
            )));
        }
        if self.fetch.tick_interval_secs == 0 {
            return Err(KrepsysError::Config(
                "tick_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Configuration module for kodama.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{KodamaError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8585
}

fn default_max_connections() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
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
    "logs/kodama.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Script engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// Seconds a session may wait for a client reply (0 = no limit).
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
    /// Maximum number of concurrently live sessions (0 = no limit).
    #[serde(default)]
    pub max_sessions: usize,
    /// Fixed seed for the random source handed to scripts and actions.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_reply_timeout() -> u64 {
    600
}

impl ScriptConfig {
    /// Reply timeout as a duration, `None` when unbounded.
    pub fn reply_timeout(&self) -> Option<Duration> {
        (self.reply_timeout_secs > 0).then(|| Duration::from_secs(self.reply_timeout_secs))
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: default_reply_timeout(),
            max_sessions: 0,
            rng_seed: None,
        }
    }
}

/// Character lock configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LockConfig {
    /// Milliseconds to wait for a guarded handle (0 = wait indefinitely).
    #[serde(default)]
    pub acquire_timeout_ms: u64,
}

impl LockConfig {
    /// Acquire timeout as a duration, `None` when unbounded.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        (self.acquire_timeout_ms > 0).then(|| Duration::from_millis(self.acquire_timeout_ms))
    }
}

/// Static game data configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path to the item catalog.
    #[serde(default = "default_items_path")]
    pub items: String,
    /// Path to the quest catalog.
    #[serde(default = "default_quests_path")]
    pub quests: String,
}

fn default_items_path() -> String {
    "data/items.toml".to_string()
}

fn default_quests_path() -> String {
    "data/quests.toml".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            items: default_items_path(),
            quests: default_quests_path(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Script engine configuration.
    #[serde(default)]
    pub script: ScriptConfig,
    /// Character lock configuration.
    #[serde(default)]
    pub lock: LockConfig,
    /// Static data configuration.
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(KodamaError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| KodamaError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_connections == 0 {
            return Err(KodamaError::Config(
                "server.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Configuration management for sledge
//!
//! Settings come from `sledge.toml` (or an explicit file), then `SLEDGE_*`
//! environment variables, then command line overrides applied by the binary.

use crate::constants::{
    DEFAULT_MAX_RANDOM_RETRIES, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_RANDOM_ID_LENGTH,
    DEFAULT_TIME_ID_PREFIX, MIN_RANDOM_ID_LENGTH,
};
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sledge.toml";

/// Available storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Ordered in-memory storage, one lock per database
    Memory,
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(StorageType::Memory),
            other => Err(Error::config(format!(
                "Invalid storage type: {}. Valid options: memory",
                other
            ))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Id generation
    pub ids: IdConfig,

    /// Channel engine tuning
    pub channel: ChannelConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub storage_type: StorageType,
}

/// Id generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    /// Prefix of `_auto_time` ids for databases without an override
    pub time_prefix: String,

    /// Per-database `_auto_time` prefixes
    pub prefixes: HashMap<String, String>,

    /// Length of `_auto` ids
    pub random_length: usize,

    /// Attempts before `_auto` generation reports a collision
    pub max_random_retries: u32,
}

/// Channel engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Bulk transforms with at least this many documents run in parallel
    pub parallel_threshold: usize,

    /// Worker threads for parallel bulk transforms (0 = auto-detect)
    pub max_workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact)
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics on `/metrics`
    pub enable_prometheus: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
        }
    }
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            time_prefix: DEFAULT_TIME_ID_PREFIX.to_string(),
            prefixes: HashMap::new(),
            random_length: DEFAULT_RANDOM_ID_LENGTH,
            max_random_retries: DEFAULT_MAX_RANDOM_RETRIES,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_workers: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
        }
    }
}

impl IdConfig {
    /// Prefix used for `_auto_time` ids in `db`
    pub fn prefix_for(&self, db: &str) -> &str {
        self.prefixes
            .get(db)
            .map(String::as_str)
            .unwrap_or(&self.time_prefix)
    }
}

impl ChannelConfig {
    /// Get the number of worker threads for parallel bulk transforms
    pub fn optimal_workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_workers
        }
    }
}

impl Config {
    /// Load configuration from `sledge.toml` when present, then the environment
    pub fn load() -> Result<Self> {
        let path = std::path::Path::new(DEFAULT_CONFIG_FILE);
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file, then the environment
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without environment overrides
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(addr) = env::var("SLEDGE_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(storage_type) = env::var("SLEDGE_STORAGE_TYPE") {
            self.storage.storage_type = storage_type.parse()?;
        }

        if let Ok(prefix) = env::var("SLEDGE_TIME_PREFIX") {
            self.ids.time_prefix = prefix;
        }

        if let Ok(level) = env::var("SLEDGE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("SLEDGE_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ids.time_prefix.is_empty() || self.ids.prefixes.values().any(String::is_empty) {
            return Err(Error::config("Time-ordered id prefixes must not be empty"));
        }

        if self.ids.random_length < MIN_RANDOM_ID_LENGTH {
            return Err(Error::config(format!(
                "Random id length too small (minimum {})",
                MIN_RANDOM_ID_LENGTH
            )));
        }

        if self.ids.max_random_retries == 0 {
            return Err(Error::config("max_random_retries must be at least 1"));
        }

        if self.channel.max_workers > 1024 {
            return Err(Error::config("Too many channel workers (maximum 1024)"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.http_addr.port(), 3000);
        assert_eq!(config.ids.prefix_for("anything"), DEFAULT_TIME_ID_PREFIX);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [ids]
            time_prefix = "hello_world"

            [ids.prefixes]
            users = "user"
            "#,
        )
        .unwrap();

        assert_eq!(config.ids.prefix_for("test_db"), "hello_world");
        assert_eq!(config.ids.prefix_for("users"), "user");
        assert_eq!(config.ids.random_length, DEFAULT_RANDOM_ID_LENGTH);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhttp_addr = \"127.0.0.1:4000\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.http_addr.port(), 4000);
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.ids.time_prefix.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ids.random_length = 4;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_type_parse() {
        assert_eq!("memory".parse::<StorageType>().unwrap(), StorageType::Memory);
        assert!("rocksdb".parse::<StorageType>().is_err());
    }
}

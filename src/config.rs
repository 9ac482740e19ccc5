use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::address::NetworkParams;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub network: NetworkConfig,
    pub history: HistoryConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Indexing service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// JSON-RPC endpoint of the indexing service
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// How often the chain height is refreshed
    pub height_poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// mainnet or testnet
    pub name: String,
}

/// History pagination behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Window width used when a request gives no `to`
    pub default_page_size: u64,
    /// Upper bound on transactions rendered concurrently for one page
    pub max_concurrent_transforms: usize,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server port
    pub port: u16,
    /// Server host/bind address
    pub host: String,
    /// Route prefix, empty to mount at the root
    pub prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8231/".to_string(),
            timeout_seconds: 30,
            height_poll_interval_seconds: 5,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "mainnet".to_string(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: crate::models::DEFAULT_PAGE_SIZE,
            max_concurrent_transforms: 8,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "127.0.0.1".to_string(),
            prefix: "/insight-api".to_string(),
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

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Same as `load`, reading the given file instead of `CONFIG_FILE`
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when it does not exist
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var("INDEX_RPC_URL") {
            self.index.endpoint = endpoint;
        }
        if let Some(timeout) = parse_env("INDEX_TIMEOUT_SECONDS")? {
            self.index.timeout_seconds = timeout;
        }
        if let Some(interval) = parse_env("HEIGHT_POLL_INTERVAL")? {
            self.index.height_poll_interval_seconds = interval;
        }

        if let Ok(network) = env::var("ZEN_NETWORK") {
            self.network.name = network;
        }

        if let Some(page_size) = parse_env("HISTORY_PAGE_SIZE")? {
            self.history.default_page_size = page_size;
        }
        if let Some(concurrency) = parse_env("HISTORY_MAX_CONCURRENCY")? {
            self.history.max_concurrent_transforms = concurrency;
        }

        if let Some(port) = parse_env("API_PORT")? {
            self.api.port = port;
        }
        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }
        if let Ok(prefix) = env::var("API_PREFIX") {
            self.api.prefix = prefix;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.index.endpoint.starts_with("http://") && !self.index.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.index.endpoint.clone()));
        }

        if self.index.timeout_seconds == 0 || self.index.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "index.timeout_seconds".to_string(),
                value: self.index.timeout_seconds.to_string(),
            });
        }

        if self.index.height_poll_interval_seconds == 0 || self.index.height_poll_interval_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "index.height_poll_interval_seconds".to_string(),
                value: self.index.height_poll_interval_seconds.to_string(),
            });
        }

        self.network_params()?;

        if self.history.default_page_size == 0 || self.history.default_page_size > 1000 {
            return Err(ConfigError::InvalidValue {
                key: "history.default_page_size".to_string(),
                value: self.history.default_page_size.to_string(),
            });
        }

        if self.history.max_concurrent_transforms == 0 || self.history.max_concurrent_transforms > 256 {
            return Err(ConfigError::InvalidValue {
                key: "history.max_concurrent_transforms".to_string(),
                value: self.history.max_concurrent_transforms.to_string(),
            });
        }

        if self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        if !self.api.prefix.is_empty() && !self.api.prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "api.prefix".to_string(),
                value: self.api.prefix.clone(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Address rules for the configured network
    pub fn network_params(&self) -> Result<&'static NetworkParams, ConfigError> {
        NetworkParams::from_name(&self.network.name)
            .ok_or_else(|| ConfigError::UnknownNetwork(self.network.name.clone()))
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parsing(e.to_string()))?;
        fs::write(path, content)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        Ok(())
    }
}

//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend address without the path prefix (e.g. "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix every endpoint lives under; may be empty
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// `limit` query parameter sent with every list request
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,

    /// Optional request timeout; unset means no timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_list_limit() -> u32 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            list_limit: default_list_limit(),
            request_timeout_secs: None,
        }
    }
}

impl ApiConfig {
    /// Base address with any trailing slash removed
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    /// Prefix with exactly one leading slash and no trailing slash, or empty
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Path of the persisted session blob
    pub file: Option<String>,
}

impl SessionConfig {
    /// Resolved session file location
    pub fn path(&self) -> PathBuf {
        match &self.file {
            Some(file) => PathBuf::from(file),
            None => dirs::data_local_dir()
                .map(|p| p.join("capstone"))
                .unwrap_or_else(|| PathBuf::from("./.capstone"))
                .join("session.json"),
        }
    }
}

/// Timings and sizes used by the page models
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_notice_ms")]
    pub success_notice_ms: u64,

    #[serde(default = "default_notice_ms")]
    pub error_notice_ms: u64,

    /// Delay between the logout confirmation and the redirect to login
    #[serde(default = "default_logout_redirect_ms")]
    pub logout_redirect_ms: u64,

    /// Number of projects shown in the dashboard's recent list
    #[serde(default = "default_recent_projects")]
    pub recent_projects: usize,
}

fn default_notice_ms() -> u64 {
    4000
}

fn default_logout_redirect_ms() -> u64 {
    2000
}

fn default_recent_projects() -> usize {
    4
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            success_notice_ms: default_notice_ms(),
            error_notice_ms: default_notice_ms(),
            logout_redirect_ms: default_logout_redirect_ms(),
            recent_projects: default_recent_projects(),
        }
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
    "warn".to_string()
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

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
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
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("capstone").join("config.toml")),
            Some(PathBuf::from("./capstone.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // API overrides
        if let Ok(url) = std::env::var("CAPSTONE_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(prefix) = std::env::var("CAPSTONE_API_PREFIX") {
            self.api.api_prefix = prefix;
        }
        if let Ok(limit) = std::env::var("CAPSTONE_LIST_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.api.list_limit = l;
            }
        }

        // Session overrides
        if let Ok(file) = std::env::var("CAPSTONE_SESSION_FILE") {
            self.session.file = Some(file);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("CAPSTONE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CAPSTONE_LOG_FORMAT") {
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
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Capstone Portal Configuration
#
# Environment variables override these settings:
# - CAPSTONE_API_URL
# - CAPSTONE_API_PREFIX
# - CAPSTONE_LIST_LIMIT
# - CAPSTONE_SESSION_FILE
# - CAPSTONE_LOG_LEVEL
# - CAPSTONE_LOG_FORMAT

[api]
# Backend address (no path prefix)
base_url = "http://localhost:8000"

# Prefix every endpoint lives under; use "" for none
api_prefix = "/api"

# `limit` sent with list requests
list_limit = 1000

# Request timeout in seconds (unset: no timeout)
# request_timeout_secs = 30

[session]
# Where the session is persisted
# file = "~/.local/share/capstone/session.json"

[ui]
# How long success and error notices stay visible (ms)
success_notice_ms = 4000
error_notice_ms = 4000

# Delay before redirecting to login after logout (ms)
logout_redirect_ms = 2000

# Projects listed under "recent" on the dashboard
recent_projects = 4

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

//! Gateway configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Command-line flags are applied by the daemon.
//!
//! ```toml
//! [server]
//! port = 3000
//! static_dir = "public"
//!
//! [rate_limit]
//! window_secs = 900
//! max_requests = 100
//!
//! [upstream]
//! base_url = "https://vpic.nhtsa.dot.gov/api/vehicles"
//! decode_timeout_ms = 10000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vpic_client::{Timeouts, DEFAULT_BASE_URL};

use crate::rate_limit::RateLimitPolicy;

/// Errors raised while assembling a [`GatewayConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

// =============================================================================
// Sections
// =============================================================================

/// Listener and static file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Document root for the frontend, served for any unmatched path
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

/// Fixed-window limits for `/api/*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

impl RateLimitConfig {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests: self.max_requests,
            window: Duration::from_secs(self.window_secs),
        }
    }
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

/// vPIC endpoint and per-operation deadlines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name used in client-facing error strings ("NHTSA API timeout")
    #[serde(default = "default_api_name")]
    pub api_name: String,
    #[serde(default = "default_decode_timeout_ms")]
    pub decode_timeout_ms: u64,
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,
    /// Deadline for makes, models, manufacturers and WMI lookups
    #[serde(default = "default_lookup_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_name: default_api_name(),
            decode_timeout_ms: default_decode_timeout_ms(),
            batch_timeout_ms: default_batch_timeout_ms(),
            default_timeout_ms: default_lookup_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            decode: Duration::from_millis(self.decode_timeout_ms),
            batch: Duration::from_millis(self.batch_timeout_ms),
            lookup: Duration::from_millis(self.default_timeout_ms),
            connect: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_name() -> String {
    "NHTSA".to_string()
}

fn default_decode_timeout_ms() -> u64 {
    10_000
}

fn default_batch_timeout_ms() -> u64 {
    20_000
}

fn default_lookup_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

// =============================================================================
// Loading
// =============================================================================

impl GatewayConfig {
    /// Load configuration from a TOML file. Missing sections and keys keep
    /// their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Recognized variables: `PORT`, `RATE_LIMIT`, `RATE_LIMIT_WINDOW_SECS`,
    /// `VPIC_BASE_URL`, `STATIC_DIR`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("PORT") {
            self.server.port = parse_number("PORT", &value)?;
        }
        if let Some(value) = get("RATE_LIMIT") {
            self.rate_limit.max_requests = parse_number("RATE_LIMIT", &value)?;
        }
        if let Some(value) = get("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse_number("RATE_LIMIT_WINDOW_SECS", &value)?;
        }
        if let Some(value) = get("VPIC_BASE_URL") {
            self.upstream.base_url = value;
        }
        if let Some(value) = get("STATIC_DIR") {
            self.server.static_dir = PathBuf::from(value);
        }

        self.validate()
    }

    /// Reject values that would make the gateway unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "rate_limit.window_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}

//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::GatewayError;

/// Which room store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// In-process map; rooms live as long as the process.
    #[default]
    Memory,
    /// Shared Redis instance; rooms survive restarts and are visible to
    /// every gateway process using the same prefix.
    Redis,
}

impl FromStr for StoreBackend {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown STORE_BACKEND {other:?} (expected memory or redis)"
            ))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown LOG_FORMAT {other:?} (expected text or json)"
            ))),
        }
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Room store backend.
    pub store_backend: StoreBackend,

    /// Redis connection string, used when `store_backend` is `Redis`.
    pub redis_url: String,

    /// Prefix prepended to every room key in the store.
    pub store_key_prefix: String,

    /// Upper bound for any single store call, in milliseconds.
    pub store_timeout_ms: u64,

    /// Capacity of each connection's outbound queue.
    pub connection_queue_capacity: usize,

    /// Request timeout for REST endpoints, in seconds.
    pub http_timeout_secs: u64,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store_backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_key_prefix: "room:".to_string(),
            store_timeout_ms: 2000,
            connection_queue_capacity: 256,
            http_timeout_secs: 10,
            log_format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR`, `STORE_BACKEND` or `LOG_FORMAT`
    /// is set but cannot be parsed.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.store_backend,
        };
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.log_format,
        };

        let redis_url = std::env::var("REDIS_URL").unwrap_or(defaults.redis_url);
        let store_key_prefix = std::env::var("STORE_KEY_PREFIX").unwrap_or(defaults.store_key_prefix);

        Ok(Self {
            listen_addr,
            store_backend,
            redis_url,
            store_key_prefix,
            store_timeout_ms: parse_env("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            connection_queue_capacity: parse_env(
                "CONNECTION_QUEUE_CAPACITY",
                defaults.connection_queue_capacity,
            ),
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            log_format,
        })
    }

    /// Store call timeout as a [`Duration`].
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// REST request timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;

use shared::config::DEFAULT_REFRESH_INTERVAL_MS;

/// Default per-query bound on a single count query, in milliseconds.
pub const DEFAULT_COUNT_TIMEOUT_MS: u64 = 10_000;

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `TALLYVANE_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `TALLYVANE_PORT`: The port to listen on (default: 8080)
/// - `TALLYVANE_REFRESH_INTERVAL_MS`: Refresh cadence for the default
///   counters, in milliseconds (default: 60000)
/// - `TALLYVANE_COUNT_TIMEOUT_MS`: Upper bound on a single count query, in
///   milliseconds (default: 10000)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Refresh cadence applied to the default counter set, in milliseconds.
    pub refresh_interval_ms: u64,
    /// Upper bound on a single count query, in milliseconds.
    pub count_timeout_ms: u64,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `TALLYVANE_PORT` is set but cannot be parsed as a valid port number
    /// - `TALLYVANE_REFRESH_INTERVAL_MS` or `TALLYVANE_COUNT_TIMEOUT_MS` is
    ///   set but cannot be parsed as a number of milliseconds
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("TALLYVANE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("TALLYVANE_PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()?
            .unwrap_or(8080);

        let refresh_interval_ms = std::env::var("TALLYVANE_REFRESH_INTERVAL_MS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()?
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);

        let count_timeout_ms = std::env::var("TALLYVANE_COUNT_TIMEOUT_MS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()?
            .unwrap_or(DEFAULT_COUNT_TIMEOUT_MS);

        Ok(Self {
            host,
            port,
            refresh_interval_ms,
            count_timeout_ms,
        })
    }

    /// Returns the socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the host and port combination cannot be parsed as a valid socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address from config")
    }

    /// Returns the per-query bound as a [`Duration`].
    #[must_use]
    pub fn count_timeout(&self) -> Duration {
        Duration::from_millis(self.count_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            count_timeout_ms: DEFAULT_COUNT_TIMEOUT_MS,
        }
    }
}

//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// In-process expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// TTL in seconds applied to API writes that carry none
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Redis connection URL; when set the server runs memory L1 + Redis L2
    pub redis_url: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `DEFAULT_TTL` - Default TTL in seconds for API writes (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REDIS_URL` - Redis URL for the second level (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// Rejects values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "CLEANUP_INTERVAL must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Sweep interval as a duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    /// Default API write TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cleanup_interval: 60,
            default_ttl: 300,
            server_port: 3000,
            redis_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.server_port, 3000);
        assert!(config.redis_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("DEFAULT_TTL");
        env::remove_var("SERVER_PORT");
        env::remove_var("REDIS_URL");

        let config = Config::from_env();
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.server_port, 3000);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_zero_cleanup_interval_invalid() {
        let config = Config {
            cleanup_interval: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.cleanup_interval(), Duration::from_secs(60));
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
    }
}

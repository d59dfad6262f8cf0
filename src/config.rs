//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Error type for parsing a policy name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid policy name: {}", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

/// Which expiration strategy `CacheService::from_config` installs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationMode {
    /// TTL measured from the last access
    #[default]
    Access,
    /// TTL measured from entry creation
    Creation,
    /// One deadline for the whole cache, measured from construction
    Fixed,
    /// Entries never expire
    Never,
}

impl FromStr for ExpirationMode {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "access" => Ok(ExpirationMode::Access),
            "creation" => Ok(ExpirationMode::Creation),
            "fixed" => Ok(ExpirationMode::Fixed),
            "never" => Ok(ExpirationMode::Never),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Which write policy `CacheService::from_config` installs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Persist on every put
    #[default]
    Through,
    /// Persist only on eviction
    Back,
}

impl FromStr for WriteMode {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "through" | "write-through" => Ok(WriteMode::Through),
            "back" | "write-back" => Ok(WriteMode::Back),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Instance name used in diagnostics
    pub name: String,
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Background refresh interval in seconds, 0 disables refreshing
    pub refresh_interval: i64,
    /// TTL in seconds handed to the expiration strategy
    pub ttl: u64,
    pub expiration: ExpirationMode,
    pub write_mode: WriteMode,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Instance name (default: "cache")
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `REFRESH_INTERVAL` - Refresh period in seconds (default: 0, disabled)
    /// - `CACHE_TTL` - TTL in seconds (default: 300)
    /// - `EXPIRATION_MODE` - access | creation | fixed | never (default: access)
    /// - `WRITE_MODE` - through | back (default: through)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env::var("CACHE_NAME").unwrap_or(defaults.name),
            capacity: parse_env("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            refresh_interval: parse_env("REFRESH_INTERVAL").unwrap_or(defaults.refresh_interval),
            ttl: parse_env("CACHE_TTL").unwrap_or(defaults.ttl),
            expiration: parse_env("EXPIRATION_MODE").unwrap_or(defaults.expiration),
            write_mode: parse_env("WRITE_MODE").unwrap_or(defaults.write_mode),
        }
    }

    /// Validates the sizing parameters shared by every construction path.
    pub fn validate(&self) -> Result<()> {
        CacheSettings::new(&self.name, self.capacity, self.refresh_interval).map(|_| ())
    }

    pub fn ttl_duration(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "cache".to_string(),
            capacity: 1000,
            refresh_interval: 0,
            ttl: 300,
            expiration: ExpirationMode::default(),
            write_mode: WriteMode::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// == Cache Settings ==
/// Validated sizing parameters for a `CacheService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    name: String,
    capacity: usize,
    refresh_interval: Option<Duration>,
}

impl CacheSettings {
    /// Validates `capacity` and a signed `refresh_interval_secs`.
    ///
    /// A zero capacity and a negative interval are both rejected; an interval
    /// of zero disables background refreshing.
    pub fn new(name: impl Into<String>, capacity: usize, refresh_interval_secs: i64) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be at least 1".to_string(),
            ));
        }
        if refresh_interval_secs < 0 {
            return Err(CacheError::InvalidConfiguration(format!(
                "refresh interval must be >= 0, got {}",
                refresh_interval_secs
            )));
        }

        let refresh_interval = match refresh_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs as u64)),
        };

        Ok(Self {
            name: name.into(),
            capacity,
            refresh_interval,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `None` when background refreshing is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }
}

impl TryFrom<&Config> for CacheSettings {
    type Error = CacheError;

    fn try_from(config: &Config) -> Result<Self> {
        CacheSettings::new(&config.name, config.capacity, config.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.refresh_interval, 0);
        assert_eq!(config.ttl, 300);
        assert_eq!(config.expiration, ExpirationMode::Access);
        assert_eq!(config.write_mode, WriteMode::Through);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_NAME");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("REFRESH_INTERVAL");
        env::remove_var("CACHE_TTL");
        env::remove_var("EXPIRATION_MODE");
        env::remove_var("WRITE_MODE");

        let config = Config::from_env();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_settings_reject_negative_interval() {
        let result = CacheSettings::new("c", 10, -1);
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_settings_reject_zero_capacity() {
        let result = CacheSettings::new("c", 0, 0);
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_settings_zero_interval_disables_refresh() {
        let settings = CacheSettings::new("c", 2, 0).unwrap();
        assert_eq!(settings.refresh_interval(), None);

        let settings = CacheSettings::new("c", 2, 3).unwrap();
        assert_eq!(settings.refresh_interval(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_policy_names_parse() {
        assert_eq!("CREATION".parse::<ExpirationMode>(), Ok(ExpirationMode::Creation));
        assert_eq!("write-back".parse::<WriteMode>(), Ok(WriteMode::Back));
        assert!("lfu".parse::<ExpirationMode>().is_err());
    }

    #[test]
    fn test_config_validate_negative_interval() {
        let config = Config {
            refresh_interval: -5,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfiguration(_))
        ));
    }
}

use std::env;
use std::num::NonZeroUsize;

use thiserror::Error;

use cachebound_core::cache::{CachePolicy, ExpirationSettings, InvalidationPolicy};

const DEFAULT_CACHE_MAX_ENTRIES: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(n) => n,
    None => panic!("default cache size must be non-zero"),
};

/// Errors raised while loading configuration. Always fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub expiration: ExpirationSettings,
    pub invalidation: InvalidationPolicy,
    /// Maximum number of entries in the in-process cache (default: 10,000)
    pub cache_max_entries: NonZeroUsize,
    /// Path to SQLite database file (default: "cachebound.db")
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_ABSOLUTE_EXPIRATION_MINUTES` - Absolute snapshot lifetime (required, > 0)
    /// - `CACHE_SLIDING_EXPIRATION_MINUTES` - Idle snapshot lifetime (required, > 0)
    /// - `CACHE_MAX_ENTRIES` - Maximum in-process cache entries (default: 10,000)
    /// - `CACHE_INVALIDATION` - `expire-only` or `on-commit` (default: `expire-only`)
    /// - `SQLITE_PATH` - SQLite database path (default: "cachebound.db")
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let absolute_minutes = required_minutes(&lookup, "CACHE_ABSOLUTE_EXPIRATION_MINUTES")?;
        let sliding_minutes = required_minutes(&lookup, "CACHE_SLIDING_EXPIRATION_MINUTES")?;

        let cache_max_entries = match lookup("CACHE_MAX_ENTRIES") {
            Some(value) => value
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|e| invalid("CACHE_MAX_ENTRIES", &value, e))?,
            None => DEFAULT_CACHE_MAX_ENTRIES,
        };

        let invalidation = match lookup("CACHE_INVALIDATION") {
            Some(value) => value
                .parse::<InvalidationPolicy>()
                .map_err(|e| invalid("CACHE_INVALIDATION", &value, e))?,
            None => InvalidationPolicy::default(),
        };

        Ok(Self {
            expiration: ExpirationSettings::new(absolute_minutes, sliding_minutes),
            invalidation,
            cache_max_entries,
            sqlite_path: lookup("SQLITE_PATH").unwrap_or_else(|| "cachebound.db".to_string()),
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://localhost:6379".to_string()),
        })
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::new(self.expiration).with_invalidation(self.invalidation)
    }
}

fn required_minutes<F>(lookup: &F, var: &'static str) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).ok_or(ConfigError::Missing(var))?;
    let minutes = value
        .trim()
        .parse::<u32>()
        .map_err(|e| invalid(var, &value, e))?;
    if minutes == 0 {
        return Err(invalid(var, &value, "must be a positive number of minutes"));
    }
    Ok(minutes)
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("CACHE_ABSOLUTE_EXPIRATION_MINUTES", "60"),
        ("CACHE_SLIDING_EXPIRATION_MINUTES", "15"),
    ];

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.expiration, ExpirationSettings::new(60, 15));
        assert_eq!(config.invalidation, InvalidationPolicy::ExpireOnly);
        assert_eq!(config.cache_max_entries.get(), 10_000);
        assert_eq!(config.sqlite_path, "cachebound.db");
        assert_eq!(config.redis_url, "redis://localhost:6379");
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("CACHE_MAX_ENTRIES", "50"),
            ("CACHE_INVALIDATION", "on-commit"),
            ("SQLITE_PATH", "/tmp/test.db"),
            ("REDIS_URL", "redis://cache:6379"),
        ]);

        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.cache_max_entries.get(), 50);
        assert_eq!(config.invalidation, InvalidationPolicy::OnCommit);
        assert_eq!(config.sqlite_path, "/tmp/test.db");
        assert_eq!(config.redis_url, "redis://cache:6379");
        assert_eq!(
            config.cache_policy().invalidation,
            InvalidationPolicy::OnCommit
        );
    }

    #[test]
    fn test_missing_expiration_is_fatal() {
        let result = Config::from_lookup(lookup(&[("CACHE_SLIDING_EXPIRATION_MINUTES", "5")]));

        assert_eq!(
            result,
            Err(ConfigError::Missing("CACHE_ABSOLUTE_EXPIRATION_MINUTES"))
        );
    }

    #[test]
    fn test_zero_minutes_is_invalid() {
        let result = Config::from_lookup(lookup(&[
            ("CACHE_ABSOLUTE_EXPIRATION_MINUTES", "60"),
            ("CACHE_SLIDING_EXPIRATION_MINUTES", "0"),
        ]));

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "CACHE_SLIDING_EXPIRATION_MINUTES",
                ..
            })
        ));
    }

    #[test]
    fn test_non_numeric_minutes_is_invalid() {
        let result = Config::from_lookup(lookup(&[
            ("CACHE_ABSOLUTE_EXPIRATION_MINUTES", "an hour"),
            ("CACHE_SLIDING_EXPIRATION_MINUTES", "5"),
        ]));

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_unknown_invalidation_policy_is_invalid() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CACHE_INVALIDATION", "sometimes"));

        let result = Config::from_lookup(lookup(&pairs));

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "CACHE_INVALIDATION",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_max_entries_is_invalid() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CACHE_MAX_ENTRIES", "0"));

        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}

//! Expiration and invalidation policy for snapshot cache entries.

use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// Per-entry expiration options passed to [`Cache::set`](super::Cache::set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntryOptions {
    /// Point in time after which the entry is gone, regardless of reads.
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Idle time after which the entry is gone. Every read restarts it.
    pub sliding_expiration: Option<Duration>,
}

impl CacheEntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn with_sliding_expiration(mut self, idle: Duration) -> Self {
        self.sliding_expiration = Some(idle);
        self
    }

    /// Moment the entry expires given its last access, or `None` if it never does.
    pub fn deadline(&self, last_access: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let sliding = self
            .sliding_expiration
            .and_then(|idle| TimeDelta::from_std(idle).ok())
            .and_then(|idle| last_access.checked_add_signed(idle));

        match (self.absolute_expiration, sliding) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }

    pub fn is_expired(&self, last_access: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.deadline(last_access).is_some_and(|deadline| now >= deadline)
    }

    /// Time left before expiry when accessed at `now`.
    ///
    /// Returns `None` when the entry never expires and `Some(Duration::ZERO)`
    /// when it has already expired.
    pub fn ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline(now)
            .map(|deadline| (deadline - now).to_std().unwrap_or(Duration::ZERO))
    }
}

/// Configured expiration windows, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationSettings {
    pub absolute_minutes: u32,
    pub sliding_minutes: u32,
}

impl ExpirationSettings {
    pub fn new(absolute_minutes: u32, sliding_minutes: u32) -> Self {
        Self {
            absolute_minutes,
            sliding_minutes,
        }
    }

    /// Builds the options for an entry written at `now`.
    pub fn entry_options(&self, now: DateTime<Utc>) -> CacheEntryOptions {
        CacheEntryOptions {
            absolute_expiration: now
                .checked_add_signed(TimeDelta::minutes(i64::from(self.absolute_minutes))),
            sliding_expiration: Some(Duration::from_secs(u64::from(self.sliding_minutes) * 60)),
        }
    }
}

/// What happens to snapshot entries when a unit of work commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidationPolicy {
    /// Writes never touch the cache; readers may see stale snapshots until
    /// the entry expires.
    #[default]
    ExpireOnly,
    /// Snapshots of every table touched by a successful commit are removed.
    OnCommit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown invalidation policy '{0}', expected 'expire-only' or 'on-commit'")]
pub struct ParseInvalidationPolicyError(pub String);

impl FromStr for InvalidationPolicy {
    type Err = ParseInvalidationPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expire-only" | "expire_only" => Ok(Self::ExpireOnly),
            "on-commit" | "on_commit" => Ok(Self::OnCommit),
            other => Err(ParseInvalidationPolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for InvalidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpireOnly => f.write_str("expire-only"),
            Self::OnCommit => f.write_str("on-commit"),
        }
    }
}

/// Everything a repository needs to know about caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub expiration: ExpirationSettings,
    pub invalidation: InvalidationPolicy,
}

impl CachePolicy {
    pub fn new(expiration: ExpirationSettings) -> Self {
        Self {
            expiration,
            invalidation: InvalidationPolicy::default(),
        }
    }

    pub fn with_invalidation(mut self, invalidation: InvalidationPolicy) -> Self {
        self.invalidation = invalidation;
        self
    }
}

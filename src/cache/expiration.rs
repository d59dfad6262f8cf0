//! Expiration Strategy Module
//!
//! Decides lazily, at read time, whether a resident entry has gone stale.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;

// == Expiration Strategy ==
/// Decides whether an entry is stale.
///
/// All strategies compare with strict greater-than: an entry exactly at its
/// TTL is still fresh.
pub trait ExpirationStrategy<K, V>: Send + Sync {
    /// Whether `entry` is stale at the instant `now`.
    fn is_expired_at(&self, entry: &CacheEntry<K, V>, now: DateTime<Utc>) -> bool;

    /// Whether `entry` is stale right now.
    fn is_expired(&self, entry: &CacheEntry<K, V>) -> bool {
        self.is_expired_at(entry, Utc::now())
    }
}

/// True when strictly more than `ttl` separates `since` from `now`.
fn elapsed_exceeds(since: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    // Negative spans (clock stepped back) never count as elapsed time
    match (now - since).to_std() {
        Ok(elapsed) => elapsed > ttl,
        Err(_) => false,
    }
}

// == Access Based ==
/// Expires entries that have not been read or refreshed for longer than `ttl`.
#[derive(Debug, Clone, Copy)]
pub struct AccessBasedExpiration {
    ttl: Duration,
}

impl AccessBasedExpiration {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> ExpirationStrategy<K, V> for AccessBasedExpiration {
    fn is_expired_at(&self, entry: &CacheEntry<K, V>, now: DateTime<Utc>) -> bool {
        elapsed_exceeds(entry.last_accessed(), now, self.ttl)
    }
}

// == Creation Based ==
/// Expires entries older than `ttl`, however often they are read.
#[derive(Debug, Clone, Copy)]
pub struct CreationBasedExpiration {
    ttl: Duration,
}

impl CreationBasedExpiration {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> ExpirationStrategy<K, V> for CreationBasedExpiration {
    fn is_expired_at(&self, entry: &CacheEntry<K, V>, now: DateTime<Utc>) -> bool {
        elapsed_exceeds(entry.created_at(), now, self.ttl)
    }
}

// == Fixed Time ==
/// Expires every entry at once, `duration` after the strategy was built.
///
/// Per-entry timestamps are ignored; once the deadline passes every read of a
/// resident entry reports it expired.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeExpiration {
    started_at: DateTime<Utc>,
    duration: Duration,
}

impl FixedTimeExpiration {
    pub fn new(duration: Duration) -> Self {
        Self::starting_at(Utc::now(), duration)
    }

    pub fn starting_at(started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl<K, V> ExpirationStrategy<K, V> for FixedTimeExpiration {
    fn is_expired_at(&self, _entry: &CacheEntry<K, V>, now: DateTime<Utc>) -> bool {
        elapsed_exceeds(self.started_at, now, self.duration)
    }
}

// == Never Expire ==
/// Entries stay fresh until evicted or removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverExpire;

impl<K, V> ExpirationStrategy<K, V> for NeverExpire {
    fn is_expired_at(&self, _entry: &CacheEntry<K, V>, _now: DateTime<Utc>) -> bool {
        false
    }
}

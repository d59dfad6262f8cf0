//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their timestamps.

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
///
/// `created_at` is fixed at construction; `last_accessed` only moves forward,
/// so `created_at <= last_accessed` holds for the life of the entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    generation: u64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(key: K, value: V) -> Self {
        Self::new_at(key, value, Utc::now())
    }

    /// Creates a new entry as if it had been created at `now`.
    pub fn new_at(key: K, value: V, now: DateTime<Utc>) -> Self {
        Self {
            key,
            value,
            created_at: now,
            last_accessed: now,
            generation: 0,
        }
    }

    /// Tags the entry with the admission counter of the cache that owns it.
    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Distinguishes this admission from any later one for the same key.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    // == Set Value ==
    /// Replaces the value and bumps the last access time.
    pub fn set_value(&mut self, value: V) {
        self.value = value;
        self.touch(Utc::now());
    }

    // == Refresh Last Accessed ==
    /// Bumps the last access time without touching the value.
    pub fn refresh_last_accessed(&mut self) {
        self.touch(Utc::now());
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        // Clock steps backwards must not break created_at <= last_accessed
        if now > self.last_accessed {
            self.last_accessed = now;
        }
    }
}

//! Backing Store Module
//!
//! The authoritative key-value source the cache fronts, plus an in-memory
//! implementation used by the demo binary and tests.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::error::Result;

// == Backing Store ==
/// External key-value store consumed by the cache.
///
/// Calls are synchronous and expected to be bounded; timeouts belong to the
/// implementation, not the cache.
pub trait BackingStore<K, V>: Send + Sync {
    /// Persists `value` under `key`, replacing any previous value.
    fn store(&self, key: K, value: V) -> Result<()>;

    /// Fetches the value for `key`, `Ok(None)` when absent.
    fn retrieve(&self, key: &K) -> Result<Option<V>>;
}

// == In-Memory Backing Store ==
/// A `BackingStore` kept in a process-local map.
#[derive(Debug)]
pub struct InMemoryBackingStore<K, V> {
    storage: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryBackingStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.storage.read().contains_key(key)
    }

    pub fn delete(&self, key: &K) -> Option<V> {
        self.storage.write().remove(key)
    }
}

impl<K, V> Default for InMemoryBackingStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for InMemoryBackingStore<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            storage: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl<K, V> BackingStore<K, V> for InMemoryBackingStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn store(&self, key: K, value: V) -> Result<()> {
        self.storage.write().insert(key, value);
        Ok(())
    }

    fn retrieve(&self, key: &K) -> Result<Option<V>> {
        Ok(self.storage.read().get(key).cloned())
    }
}

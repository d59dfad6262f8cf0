//! Write Policy Module
//!
//! Controls when cached writes reach the backing store.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::store::BackingStore;

// == Write Policy ==
/// Propagates cache writes to the backing store.
pub trait WritePolicy<K, V>: Send + Sync {
    /// Called on every `put`.
    fn handle_write(&self, key: &K, value: &V) -> Result<()>;

    /// Called when an entry leaves the cache through capacity eviction.
    ///
    /// Explicit removal and lazy expiration never reach this hook.
    fn handle_eviction(&self, key: &K, value: &V) -> Result<()>;
}

// == Write Through ==
/// Stores every write immediately; evictions have nothing left to persist.
pub struct WriteThroughPolicy<K, V> {
    store: Arc<dyn BackingStore<K, V>>,
}

impl<K, V> WriteThroughPolicy<K, V> {
    pub fn new(store: Arc<dyn BackingStore<K, V>>) -> Self {
        Self { store }
    }
}

impl<K, V> WritePolicy<K, V> for WriteThroughPolicy<K, V>
where
    K: Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn handle_write(&self, key: &K, value: &V) -> Result<()> {
        self.store.store(key.clone(), value.clone())
    }

    fn handle_eviction(&self, _key: &K, _value: &V) -> Result<()> {
        Ok(())
    }
}

// == Write Back ==
/// Defers persistence until eviction.
///
/// Entries that are removed or expire before being evicted are never stored.
pub struct WriteBackPolicy<K, V> {
    store: Arc<dyn BackingStore<K, V>>,
}

impl<K, V> WriteBackPolicy<K, V> {
    pub fn new(store: Arc<dyn BackingStore<K, V>>) -> Self {
        Self { store }
    }
}

impl<K, V> WritePolicy<K, V> for WriteBackPolicy<K, V>
where
    K: Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn handle_write(&self, _key: &K, _value: &V) -> Result<()> {
        Ok(())
    }

    fn handle_eviction(&self, key: &K, value: &V) -> Result<()> {
        debug!("Write-back: persisting evicted entry");
        self.store.store(key.clone(), value.clone())
    }
}

//! Cache Service Module
//!
//! Orchestrates the entry map, the eviction policy, the write policy, the
//! expiration strategy and the background refresh task.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, info_span, warn, Span};

use crate::cache::{
    AccessBasedExpiration, CacheEntry, CacheKey, CacheStats, CacheValue, CreationBasedExpiration,
    EvictionPolicy, ExpirationStrategy, FixedTimeExpiration, LruPolicy, NeverExpire,
    WriteBackPolicy, WritePolicy, WriteThroughPolicy,
};
use crate::config::{CacheSettings, Config, ExpirationMode, WriteMode};
use crate::error::{CacheError, Result};
use crate::store::BackingStore;
use crate::tasks::{spawn_refresh_task, RefreshHandle};

// == Cache State ==
/// The entry map and the eviction ordering, always mutated together.
struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<K, V>>,
    eviction: Box<dyn EvictionPolicy<K>>,
    stats: CacheStats,
    // Bumped on every admission; tags entries so a re-put is never mistaken
    // for the entry it replaced
    next_generation: u64,
}

// == Refresh Report ==
/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries whose value was replaced from the backing store
    pub refreshed: usize,
    /// Keys the backing store had no value for, or that left the cache mid-cycle
    pub skipped: usize,
    /// Keys whose backing store lookup failed
    pub failed: usize,
}

// == Cache Core ==
/// Shared between the `CacheService` handle and its refresh task.
pub(crate) struct CacheCore<K, V> {
    capacity: usize,
    state: Mutex<CacheState<K, V>>,
    store: Arc<dyn BackingStore<K, V>>,
    write_policy: Box<dyn WritePolicy<K, V>>,
    expiration: Box<dyn ExpirationStrategy<K, V>>,
    span: Span,
}

impl<K: CacheKey, V: CacheValue> CacheCore<K, V> {
    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    // == Insert ==
    /// Admits a fresh entry for `key`, evicting first whenever the cache is
    /// at capacity. Overwrites are no exception. Caller holds the state lock.
    fn insert(&self, state: &mut CacheState<K, V>, key: K, value: V) -> Result<()> {
        if state.entries.len() >= self.capacity {
            self.evict_one(state)?;
        }

        self.write_policy.handle_write(&key, &value)?;

        // Always a new entry: an overwrite restarts the creation clock
        state.next_generation += 1;
        let entry = CacheEntry::new(key.clone(), value).with_generation(state.next_generation);
        state.entries.insert(key.clone(), entry);
        state.eviction.record_access(&key);
        state.stats.set_total_entries(state.entries.len());

        debug!(key = %key, "Cached key");
        Ok(())
    }

    // == Evict One ==
    /// Removes the eviction candidate, handing it to the write policy first.
    ///
    /// If the write policy fails the candidate stays resident.
    fn evict_one(&self, state: &mut CacheState<K, V>) -> Result<()> {
        let Some(candidate) = state.eviction.eviction_candidate() else {
            return Ok(());
        };

        if let Some(entry) = state.entries.get(&candidate) {
            self.write_policy
                .handle_eviction(entry.key(), entry.value())?;
        }

        state.entries.remove(&candidate);
        state.eviction.remove_key(&candidate);
        state.stats.record_eviction();
        state.stats.set_total_entries(state.entries.len());

        info!(key = %candidate, "Evicted key");
        Ok(())
    }

    fn detach(&self, state: &mut CacheState<K, V>, key: &K) -> Option<CacheEntry<K, V>> {
        let removed = state.entries.remove(key);
        state.eviction.remove_key(key);
        state.stats.set_total_entries(state.entries.len());
        removed
    }

    fn put(&self, key: K, value: V) -> Result<()> {
        let mut guard = self.state.lock();
        self.insert(&mut guard, key, value)
    }

    fn get(&self, key: &K) -> Result<V> {
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let expired = state
                .entries
                .get(key)
                .map(|entry| self.expiration.is_expired(entry));

            match expired {
                None => state.stats.record_miss(),
                Some(true) => {
                    self.detach(state, key);
                    state.stats.record_expiration();
                    warn!(key = %key, "Expired key was removed");
                    return Err(CacheError::Expired(key.to_string()));
                }
                Some(false) => {
                    let value = Self::hit(state, key);
                    state.stats.record_hit();
                    return value;
                }
            }
        }

        self.load_from_store(key)
    }

    /// Records the access on a resident entry and returns its value.
    fn hit(state: &mut CacheState<K, V>, key: &K) -> Result<V> {
        state.eviction.record_access(key);
        let entry = state
            .entries
            .get_mut(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        entry.refresh_last_accessed();
        Ok(entry.value().clone())
    }

    // == Load From Store ==
    /// Cache miss path: fetch from the backing store and admit the value.
    ///
    /// The lookup runs without the state lock. If another caller admitted the
    /// key in the meantime, the resident entry wins and the fetched value is
    /// dropped.
    fn load_from_store(&self, key: &K) -> Result<V> {
        debug!(key = %key, "Cache miss, retrieving from backing store");
        let fetched = self.store.retrieve(key)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let resident = state
            .entries
            .get(key)
            .map(|entry| !self.expiration.is_expired(entry))
            .unwrap_or(false);
        if resident {
            debug!(key = %key, "Key admitted concurrently, keeping resident entry");
            return Self::hit(state, key);
        }

        match fetched {
            Some(value) => {
                self.insert(state, key.clone(), value.clone())?;
                Ok(value)
            }
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    fn remove(&self, key: &K) {
        let mut guard = self.state.lock();
        if self.detach(&mut guard, key).is_some() {
            info!(key = %key, "Removed key");
        }
    }

    // == Refresh Cycle ==
    /// Re-reads every resident key from the backing store and updates values
    /// in place.
    ///
    /// Keys are snapshotted up front and the lock is released around each
    /// store lookup. An update only lands on the exact entry seen in the
    /// snapshot, matched by admission generation: keys removed or re-put
    /// since then are skipped. Never adds or removes keys.
    pub(crate) fn refresh_cycle(&self) -> RefreshReport {
        let snapshot: Vec<(K, u64)> = {
            let state = self.state.lock();
            state
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.generation()))
                .collect()
        };

        let mut report = RefreshReport::default();
        for (key, generation) in snapshot {
            match self.store.retrieve(&key) {
                Ok(Some(value)) => {
                    let mut guard = self.state.lock();
                    let state = &mut *guard;
                    match state.entries.get_mut(&key) {
                        Some(entry) if entry.generation() == generation => {
                            entry.set_value(value);
                            state.stats.record_refresh();
                            report.refreshed += 1;
                            debug!(key = %key, "Refreshed key");
                        }
                        _ => report.skipped += 1,
                    }
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    self.state.lock().stats.record_refresh_failure();
                    report.failed += 1;
                    warn!(key = %key, error = %e, "Failed to refresh key");
                }
            }
        }
        report
    }
}

// == Cache Service ==
/// Bounded key-value cache in front of a `BackingStore`.
///
/// All mutations of the entry map and the eviction ordering happen under one
/// lock, so concurrent callers and the refresh task always observe the two in
/// agreement.
pub struct CacheService<K, V> {
    core: Arc<CacheCore<K, V>>,
    refresh: Option<RefreshHandle>,
}

impl<K: CacheKey, V: CacheValue> CacheService<K, V> {
    // == Constructor ==
    /// Creates a cache from validated settings and its collaborators.
    ///
    /// When refreshing is enabled the refresh task is spawned on the current
    /// tokio runtime; construction fails if there is none. The eviction policy
    /// must start out empty.
    pub fn new(
        settings: CacheSettings,
        eviction: Box<dyn EvictionPolicy<K>>,
        store: Arc<dyn BackingStore<K, V>>,
        write_policy: Box<dyn WritePolicy<K, V>>,
        expiration: Box<dyn ExpirationStrategy<K, V>>,
    ) -> Result<Self> {
        if !eviction.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "eviction policy must not track keys before the cache owns them".to_string(),
            ));
        }

        let runtime = match settings.refresh_interval() {
            Some(_) => Some(tokio::runtime::Handle::try_current().map_err(|_| {
                CacheError::InvalidConfiguration(
                    "background refresh requires a running tokio runtime".to_string(),
                )
            })?),
            None => None,
        };

        let span = info_span!("cache", name = %settings.name());
        let core = Arc::new(CacheCore {
            capacity: settings.capacity(),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                eviction,
                stats: CacheStats::new(),
                next_generation: 0,
            }),
            store,
            write_policy,
            expiration,
            span,
        });

        let refresh = match (runtime, settings.refresh_interval()) {
            (Some(runtime), Some(interval)) => {
                Some(spawn_refresh_task(&runtime, core.clone(), interval))
            }
            _ => {
                let _enter = core.span.enter();
                warn!("Refresh interval is 0, background refresh is disabled");
                None
            }
        };

        Ok(Self { core, refresh })
    }

    /// Creates an LRU cache with the expiration strategy and write policy
    /// named by `config`.
    pub fn from_config(config: &Config, store: Arc<dyn BackingStore<K, V>>) -> Result<Self> {
        let settings = CacheSettings::try_from(config)?;

        let expiration: Box<dyn ExpirationStrategy<K, V>> = match config.expiration {
            ExpirationMode::Access => Box::new(AccessBasedExpiration::new(config.ttl_duration())),
            ExpirationMode::Creation => {
                Box::new(CreationBasedExpiration::new(config.ttl_duration()))
            }
            ExpirationMode::Fixed => Box::new(FixedTimeExpiration::new(config.ttl_duration())),
            ExpirationMode::Never => Box::new(NeverExpire),
        };

        let write_policy: Box<dyn WritePolicy<K, V>> = match config.write_mode {
            WriteMode::Through => Box::new(WriteThroughPolicy::new(store.clone())),
            WriteMode::Back => Box::new(WriteBackPolicy::new(store.clone())),
        };

        Self::new(
            settings,
            Box::new(LruPolicy::new()),
            store,
            write_policy,
            expiration,
        )
    }

    // == Put ==
    /// Stores `value` under `key`.
    ///
    /// At capacity the policy's candidate is evicted first through the write
    /// policy's eviction hook, even when `key` is already resident. The stored entry is always a
    /// fresh one, so creation-based expiration restarts on overwrite.
    pub fn put(&self, key: K, value: V) -> Result<()> {
        let _enter = self.core.span.enter();
        self.core.put(key, value)
    }

    // == Get ==
    /// Returns the value for `key`.
    ///
    /// A miss falls through to the backing store and admits what it finds.
    /// A stale hit purges the entry and fails with `CacheError::Expired`; the
    /// backing store copy is left alone, so a later `get` may re-admit it.
    pub fn get(&self, key: &K) -> Result<V> {
        let _enter = self.core.span.enter();
        self.core.get(key)
    }

    // == Remove ==
    /// Drops `key` from the cache. No-op when absent; never persisted.
    pub fn remove(&self, key: &K) {
        let _enter = self.core.span.enter();
        self.core.remove(key)
    }

    // == Refresh Now ==
    /// Runs one refresh cycle on the calling thread.
    pub fn refresh_now(&self) -> RefreshReport {
        let _enter = self.core.span.enter();
        self.core.refresh_cycle()
    }

    // == Shutdown Scheduler ==
    /// Stops future refresh cycles. A cycle already running is left to finish.
    pub fn shutdown_scheduler(&self) {
        let _enter = self.core.span.enter();
        if let Some(refresh) = &self.refresh {
            refresh.shutdown();
            info!("Refresh scheduler shut down");
        }
    }

    /// Whether a refresh task was started and has not been shut down.
    pub fn is_refreshing(&self) -> bool {
        self.refresh
            .as_ref()
            .map(|refresh| !refresh.is_shutdown())
            .unwrap_or(false)
    }

    pub fn refresh_handle(&self) -> Option<&RefreshHandle> {
        self.refresh.as_ref()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.core.state.lock().entries.contains_key(key)
    }

    /// Resident keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.core.state.lock().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.core.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.core.capacity
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.core.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let state = self.core.state.lock();
        state.entries.len() == state.eviction.len()
            && state.entries.keys().all(|key| state.eviction.contains(key))
    }
}

impl<K, V> Drop for CacheService<K, V> {
    fn drop(&mut self) {
        if let Some(refresh) = &self.refresh {
            refresh.shutdown();
        }
    }
}

//! Integration Tests for the cache service
//!
//! Drives the public API end to end over an in-memory backing store.

use std::sync::Arc;
use std::time::Duration;

use write_policy_cache::cache::{
    AccessBasedExpiration, CacheService, CreationBasedExpiration, ExpirationStrategy,
    FixedTimeExpiration, LruPolicy, NeverExpire, WriteBackPolicy, WritePolicy,
    WriteThroughPolicy,
};
use write_policy_cache::config::{Config, ExpirationMode, WriteMode};
use write_policy_cache::{BackingStore, CacheError, CacheSettings, InMemoryBackingStore};

// == Helper Functions ==

type Store = InMemoryBackingStore<String, i32>;

fn key(k: &str) -> String {
    k.to_string()
}

fn build(
    capacity: usize,
    refresh_interval: i64,
    write_back: bool,
    expiration: Box<dyn ExpirationStrategy<String, i32>>,
) -> (CacheService<String, i32>, Arc<Store>) {
    let store = Arc::new(Store::new());
    let shared: Arc<dyn BackingStore<String, i32>> = store.clone();
    let write_policy: Box<dyn WritePolicy<String, i32>> = if write_back {
        Box::new(WriteBackPolicy::new(shared.clone()))
    } else {
        Box::new(WriteThroughPolicy::new(shared.clone()))
    };
    let cache = CacheService::new(
        CacheSettings::new("integration", capacity, refresh_interval).unwrap(),
        Box::new(LruPolicy::new()),
        shared,
        write_policy,
        expiration,
    )
    .unwrap();
    (cache, store)
}

// == Capacity and LRU ==

#[test]
fn test_oldest_key_evicted_and_not_in_store() {
    let (cache, _store) = build(2, 0, true, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();
    cache.put(key("B"), 2).unwrap();
    cache.put(key("C"), 3).unwrap();

    assert!(!cache.contains_key(&key("A")));
    assert_eq!(cache.get(&key("B")).unwrap(), 2);
    assert_eq!(cache.get(&key("C")).unwrap(), 3);
}

#[test]
fn test_evicted_key_without_store_copy_is_not_found() {
    // Write-through would have persisted A, so only a store that never saw A
    // makes the fallback fail
    let (cache, store) = build(2, 0, false, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();
    cache.put(key("B"), 2).unwrap();
    cache.put(key("C"), 3).unwrap();
    store.delete(&key("A"));

    assert_eq!(
        cache.get(&key("A")),
        Err(CacheError::NotFound("A".to_string()))
    );
    assert_eq!(cache.get(&key("B")).unwrap(), 2);
    assert_eq!(cache.get(&key("C")).unwrap(), 3);
}

#[test]
fn test_read_refreshes_lru_position() {
    let (cache, _store) = build(2, 0, false, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();
    cache.put(key("B"), 2).unwrap();
    cache.get(&key("A")).unwrap();
    cache.put(key("C"), 3).unwrap();

    assert!(cache.contains_key(&key("A")));
    assert!(!cache.contains_key(&key("B")));
    assert!(cache.contains_key(&key("C")));
}

#[test]
fn test_one_over_capacity_evicts_exactly_one() {
    let (cache, _store) = build(5, 0, false, Box::new(NeverExpire));

    for (i, k) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
        cache.put(key(k), i as i32).unwrap();
    }

    assert_eq!(cache.len(), 5);
    assert_eq!(cache.stats().evictions, 1);
    assert!(!cache.contains_key(&key("a")));
}

#[test]
fn test_overwrite_at_capacity_evicts_and_writes_back_lru() {
    let (cache, store) = build(2, 0, true, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();
    cache.put(key("B"), 2).unwrap();
    cache.put(key("B"), 3).unwrap();

    assert!(!cache.contains_key(&key("A")));
    assert_eq!(store.retrieve(&key("A")).unwrap(), Some(1));
    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.get(&key("B")).unwrap(), 3);
}

// == Write Policies ==

#[test]
fn test_write_back_persists_on_eviction_only() {
    let (cache, store) = build(1, 0, true, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();
    assert_eq!(store.retrieve(&key("A")).unwrap(), None);

    cache.put(key("B"), 2).unwrap();
    assert_eq!(store.retrieve(&key("A")).unwrap(), Some(1));
    assert_eq!(store.retrieve(&key("B")).unwrap(), None);
}

#[test]
fn test_write_through_persists_immediately() {
    let (cache, store) = build(1, 0, false, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();

    assert_eq!(store.retrieve(&key("A")).unwrap(), Some(1));
}

#[test]
fn test_evicted_write_back_entry_comes_back_from_store() {
    let (cache, _store) = build(1, 0, true, Box::new(NeverExpire));

    cache.put(key("A"), 1).unwrap();
    cache.put(key("B"), 2).unwrap();

    // A was persisted on eviction; reading it evicts (and persists) B
    assert_eq!(cache.get(&key("A")).unwrap(), 1);
    assert_eq!(cache.get(&key("B")).unwrap(), 2);
}

// == Expiration ==

#[test]
fn test_access_based_expiration_after_idle() {
    let (cache, _store) = build(
        4,
        0,
        true,
        Box::new(AccessBasedExpiration::new(Duration::from_secs(1))),
    );

    cache.put(key("K"), 1).unwrap();
    std::thread::sleep(Duration::from_millis(1300));

    assert_eq!(
        cache.get(&key("K")),
        Err(CacheError::Expired("K".to_string()))
    );
    assert!(!cache.contains_key(&key("K")));
}

#[test]
fn test_access_keeps_entry_alive() {
    let (cache, _store) = build(
        4,
        0,
        true,
        Box::new(AccessBasedExpiration::new(Duration::from_millis(600))),
    );

    cache.put(key("K"), 1).unwrap();
    for _ in 0..3 {
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(cache.get(&key("K")).unwrap(), 1);
    }
}

#[test]
fn test_creation_based_expiration_ignores_reads() {
    let (cache, _store) = build(
        4,
        0,
        true,
        Box::new(CreationBasedExpiration::new(Duration::from_millis(500))),
    );

    cache.put(key("K"), 1).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(cache.get(&key("K")).unwrap(), 1);
    std::thread::sleep(Duration::from_millis(400));

    assert!(matches!(cache.get(&key("K")), Err(CacheError::Expired(_))));
}

#[test]
fn test_fixed_time_expiration_shared_deadline() {
    let (cache, _store) = build(
        4,
        0,
        true,
        Box::new(FixedTimeExpiration::new(Duration::from_millis(500))),
    );

    cache.put(key("early"), 1).unwrap();
    std::thread::sleep(Duration::from_millis(400));
    cache.put(key("late"), 2).unwrap();
    std::thread::sleep(Duration::from_millis(300));

    assert!(matches!(cache.get(&key("early")), Err(CacheError::Expired(_))));
    assert!(matches!(cache.get(&key("late")), Err(CacheError::Expired(_))));
}

#[test]
fn test_expired_write_through_entry_is_readmitted() {
    let (cache, _store) = build(
        4,
        0,
        false,
        Box::new(CreationBasedExpiration::new(Duration::from_millis(200))),
    );

    cache.put(key("K"), 7).unwrap();
    std::thread::sleep(Duration::from_millis(300));

    assert!(matches!(cache.get(&key("K")), Err(CacheError::Expired(_))));
    assert_eq!(cache.get(&key("K")).unwrap(), 7);
    assert_eq!(cache.get(&key("K")).unwrap(), 7);
}

// == Refresh Scheduling ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_refresh_after_scheduler_shutdown() {
    let (cache, store) = build(4, 2, true, Box::new(NeverExpire));

    cache.put(key("K"), 1).unwrap();
    cache.shutdown_scheduler();
    store.store(key("K"), 99).unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(cache.get(&key("K")).unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_picks_up_store_changes() {
    let (cache, store) = build(4, 1, true, Box::new(NeverExpire));

    cache.put(key("K"), 1).unwrap();
    store.store(key("K"), 2).unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(cache.get(&key("K")).unwrap(), 2);
    cache.shutdown_scheduler();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_keep_capacity() {
    let (cache, _store) = build(16, 1, true, Box::new(NeverExpire));
    let cache = Arc::new(cache);

    let mut workers = Vec::new();
    for worker in 0..4 {
        let cache = cache.clone();
        workers.push(tokio::task::spawn_blocking(move || {
            for i in 0..500 {
                let k = format!("w{}-{}", worker, i % 40);
                cache.put(k.clone(), i).unwrap();
                let _ = cache.get(&k);
                if i % 7 == 0 {
                    cache.remove(&k);
                }
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }

    assert!(cache.len() <= 16);
    assert_eq!(cache.stats().total_entries, cache.len());
    cache.shutdown_scheduler();
}

// == Construction ==

#[test]
fn test_negative_refresh_interval_rejected() {
    let config = Config {
        refresh_interval: -1,
        ..Config::default()
    };
    let store: Arc<dyn BackingStore<String, i32>> = Arc::new(Store::new());

    let result = CacheService::from_config(&config, store);

    assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
}

#[test]
fn test_zero_capacity_rejected() {
    let config = Config {
        capacity: 0,
        ..Config::default()
    };
    let store: Arc<dyn BackingStore<String, i32>> = Arc::new(Store::new());

    let result = CacheService::from_config(&config, store);

    assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
}

#[test]
fn test_from_config_creation_expiration() {
    let config = Config {
        capacity: 3,
        ttl: 0,
        expiration: ExpirationMode::Creation,
        write_mode: WriteMode::Through,
        ..Config::default()
    };
    let store = Arc::new(Store::new());
    let cache: CacheService<String, i32> =
        CacheService::from_config(&config, store.clone()).unwrap();

    cache.put(key("K"), 1).unwrap();
    std::thread::sleep(Duration::from_millis(20));

    assert!(matches!(cache.get(&key("K")), Err(CacheError::Expired(_))));
    assert_eq!(store.retrieve(&key("K")).unwrap(), Some(1));
}

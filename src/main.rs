//! Write Policy Cache - demonstration binary
//!
//! Builds a cache from environment configuration over a seeded in-memory
//! backing store and walks it through its put/get/remove, eviction and
//! refresh behavior.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use write_policy_cache::{BackingStore, CacheService, Config, InMemoryBackingStore};

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Seed the backing store and build the cache
/// 4. Exercise put, get, remove and capacity eviction
/// 5. Let the refresh task run, then shut it down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "write_policy_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Write Policy Cache demo");

    let mut config = Config::from_env();
    if std::env::var("CACHE_CAPACITY").is_err() {
        config.capacity = 2;
    }
    if std::env::var("REFRESH_INTERVAL").is_err() {
        config.refresh_interval = 3;
    }
    config.validate()?;
    info!(
        "Configuration loaded: capacity={}, refresh_interval={}s, ttl={}s, expiration={:?}, write_mode={:?}",
        config.capacity, config.refresh_interval, config.ttl, config.expiration, config.write_mode
    );

    let store: Arc<InMemoryBackingStore<String, String>> = Arc::new(InMemoryBackingStore::new());
    store.store("key1".into(), "value1".into())?;
    store.store("key2".into(), "value2_updated".into())?;
    store.store("key3".into(), "value3".into())?;

    let cache: CacheService<String, String> = CacheService::from_config(&config, store.clone())?;

    info!("---------- Add and retrieve ----------");
    cache.put("key1".into(), "value1".into())?;
    info!("Get key1: {}", cache.get(&"key1".into())?);

    info!("---------- Retrieve missing key ----------");
    if let Err(e) = cache.get(&"keyX".into()) {
        warn!("Lookup of keyX failed: {}", e);
    }

    info!("---------- Update existing key ----------");
    cache.put("key1".into(), "value2".into())?;
    info!("Get key1: {}", cache.get(&"key1".into())?);

    info!("---------- Remove key ----------");
    cache.remove(&"key1".into());
    info!("key1 resident after remove: {}", cache.contains_key(&"key1".into()));

    info!("---------- Evict on capacity ----------");
    cache.put("key1".into(), "value1".into())?;
    cache.put("key2".into(), "value2".into())?;
    cache.put("key3".into(), "value3".into())?;
    info!("key1 resident after eviction: {}", cache.contains_key(&"key1".into()));
    info!("Get key2: {}", cache.get(&"key2".into())?);
    info!("Get key3: {}", cache.get(&"key3".into())?);

    if cache.is_refreshing() {
        info!("---------- Background refresh ----------");
        let wait = Duration::from_secs(config.refresh_interval as u64 + 1);
        tokio::time::sleep(wait).await;
        for key in cache.keys() {
            match cache.get(&key) {
                Ok(value) => info!("Get {} after refresh: {}", key, value),
                Err(e) => warn!("Get {} after refresh failed: {}", key, e),
            }
        }

        cache.shutdown_scheduler();
        tokio::time::sleep(wait).await;
        info!("Refresh cycles stopped after shutdown");
    }

    let stats = cache.stats();
    info!("Final stats: {}", serde_json::to_string(&stats)?);

    Ok(())
}

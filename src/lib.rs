//! Write Policy Cache - an in-process key-value cache
//!
//! Fronts a backing store with pluggable LRU eviction, TTL expiration,
//! write-through or write-back propagation and periodic background refresh.

pub mod cache;
pub mod config;
pub mod error;
pub mod store;
pub mod tasks;

pub use cache::{CacheService, CacheStats};
pub use config::{CacheSettings, Config};
pub use error::{CacheError, Result};
pub use store::{BackingStore, InMemoryBackingStore};

//! Cache Module
//!
//! Provides the cache service and its pluggable eviction, expiration and
//! write policies.

use std::fmt::Display;
use std::hash::Hash;

mod entry;
mod expiration;
mod lru;
mod service;
mod stats;
mod write_policy;


// Re-export public types
pub use entry::CacheEntry;
pub use expiration::{
    AccessBasedExpiration, CreationBasedExpiration, ExpirationStrategy, FixedTimeExpiration,
    NeverExpire,
};
pub use lru::{EvictionPolicy, LruPolicy};
pub use service::{CacheService, RefreshReport};
pub use stats::CacheStats;
pub use write_policy::{WriteBackPolicy, WritePolicy, WriteThroughPolicy};

pub(crate) use service::CacheCore;

// == Key and Value Bounds ==
/// Requirements on cache keys. Implemented for every qualifying type.
pub trait CacheKey: Eq + Hash + Clone + Display + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Display + Send + Sync + 'static {}

/// Requirements on cached values. Implemented for every qualifying type.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + 'static {}

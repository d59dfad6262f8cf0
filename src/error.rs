//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent from both the cache and the backing store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key was resident but stale, and has been purged
    #[error("Key expired: {0}")]
    Expired(String),

    /// Rejected construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A backing store operation failed
    #[error("Backing store error: {0}")]
    Backend(String),
}

impl CacheError {
    /// True for the conditions a caller is expected to recover from on `get`.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

//! Client contract of the shared key-value store.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Store unreachable or refused the command.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Stored value is not a valid response state.
    #[error("Cache value decode error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// String key/value operations against a networked store.
///
/// Expiry is enforced by the store; callers only pass the TTL.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Unconditional write.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Replace the value only if the key exists and currently holds `expected`.
    /// Keeps the remaining TTL. Returns whether the write happened.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: &str,
        value: String,
    ) -> Result<bool, CacheError>;

    /// Returns whether a key was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

//! Typed access to rendezvous slots.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::client::{CacheClient, CacheError};
use crate::rendezvous::{CacheKey, ResponseState};

/// [`ResponseState`] view over a [`CacheClient`], JSON encoded.
#[derive(Clone)]
pub struct StateCache {
    client: Arc<dyn CacheClient>,
    pending_ttl: Duration,
}

impl StateCache {
    pub fn new(client: Arc<dyn CacheClient>, pending_ttl: Duration) -> Self {
        Self { client, pending_ttl }
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<ResponseState>, CacheError> {
        match self.client.get(key.as_str()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write the `Pending` placeholder, overwriting whatever is there.
    pub async fn put_pending(&self, key: &CacheKey) -> Result<(), CacheError> {
        let value = serde_json::to_string(&ResponseState::Pending)?;
        self.client
            .set(key.as_str(), value, Some(self.pending_ttl))
            .await
    }

    /// Move an existing `Pending` slot to `Resolved`.
    ///
    /// Absent keys and already resolved keys are left untouched; returns
    /// whether the transition happened.
    pub async fn resolve_if_pending(&self, key: &CacheKey, valid: bool) -> Result<bool, CacheError> {
        let expected = serde_json::to_string(&ResponseState::Pending)?;
        let value = serde_json::to_string(&ResponseState::Resolved { valid })?;
        self.client
            .compare_and_set(key.as_str(), &expected, value)
            .await
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.client.delete(key.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;
    use crate::rendezvous::{CorrelationId, InstanceNamespace};

    fn setup() -> (InMemoryCache, StateCache, CacheKey) {
        let memory = InMemoryCache::new();
        let states = StateCache::new(Arc::new(memory.clone()), Duration::from_secs(60));
        let key = InstanceNamespace::generate().key_for("test", &CorrelationId::new());
        (memory, states, key)
    }

    #[tokio::test]
    async fn test_pending_then_resolved() {
        let (_, states, key) = setup();
        states.put_pending(&key).await.unwrap();
        assert_eq!(states.get(&key).await.unwrap(), Some(ResponseState::Pending));

        assert!(states.resolve_if_pending(&key, true).await.unwrap());
        assert_eq!(
            states.get(&key).await.unwrap(),
            Some(ResponseState::Resolved { valid: true })
        );
    }

    #[tokio::test]
    async fn test_duplicate_resolution_is_ignored() {
        let (_, states, key) = setup();
        states.put_pending(&key).await.unwrap();
        assert!(states.resolve_if_pending(&key, true).await.unwrap());
        assert!(!states.resolve_if_pending(&key, false).await.unwrap());
        assert_eq!(
            states.get(&key).await.unwrap(),
            Some(ResponseState::Resolved { valid: true })
        );
    }

    #[tokio::test]
    async fn test_resolve_never_creates_key() {
        let (memory, states, key) = setup();
        assert!(!states.resolve_if_pending(&key, true).await.unwrap());
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_codec_error() {
        let (memory, states, key) = setup();
        memory.set(key.as_str(), "not json".to_string(), None).await.unwrap();
        assert!(matches!(states.get(&key).await, Err(CacheError::Codec(_))));
    }
}

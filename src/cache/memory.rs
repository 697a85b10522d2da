//! In-process cache adapter.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::client::{CacheClient, CacheError};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Instant::now() >= at).unwrap_or(false)
    }
}

/// A thread-safe [`CacheClient`] backed by a `DashMap`, with lazy TTL expiry.
///
/// Clones share the same map, so every coordinator built from one instance
/// sees the same store.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    inner: Arc<DashMap<String, Slot>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, slot| !slot.is_expired());
        before.saturating_sub(self.inner.len())
    }

    /// Live keys. Expired entries are purged first.
    pub fn keys(&self) -> Vec<String> {
        self.purge_expired();
        self.inner
            .iter()
            .filter(|r| !r.value().is_expired())
            .map(|r| r.key().clone())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.get(key).map(|r| !r.is_expired()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheClient for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = match self.inner.get(key) {
            Some(slot) if !slot.is_expired() => return Ok(Some(slot.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.inner.remove_if(key, |_, slot| slot.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        // A TTL past the clock's range means no expiry.
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.inner.insert(key.to_string(), Slot { value, expires_at });
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: &str,
        value: String,
    ) -> Result<bool, CacheError> {
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.remove();
                    return Ok(false);
                }
                if occupied.get().value != expected {
                    return Ok(false);
                }
                occupied.get_mut().value = value;
                Ok(true)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self
            .inner
            .remove(key)
            .map(|(_, slot)| !slot.is_expired())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = InMemoryCache::new();
        assert!(cache.get("k").await.unwrap().is_none());

        cache.set("k", "v1".to_string(), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v1"));
        assert!(cache.contains_key("k"));

        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let cache = InMemoryCache::new();
        assert!(!cache.compare_and_set("k", "a", "b".to_string()).await.unwrap());
        assert!(!cache.contains_key("k"));

        cache.set("k", "a".to_string(), None).await.unwrap();
        assert!(!cache.compare_and_set("k", "x", "b".to_string()).await.unwrap());
        assert!(cache.compare_and_set("k", "a", "b".to_string()).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "a".to_string(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(cache.contains_key("k"));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(!cache.compare_and_set("k", "a", "b".to_string()).await.unwrap());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_len_purges_unread_expired_entries() {
        let cache = InMemoryCache::new();
        cache
            .set("leaked", "a".to_string(), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        cache.set("live", "b".to_string(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.inner.len(), 1);
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Some(Duration::from_secs(i64::MAX as u64)))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }
}

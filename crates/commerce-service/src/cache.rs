//! Optional read-through cache consulted by the facade.
//!
//! The facade only ever stores and fetches by key; a missing or failing
//! cache changes latency, never results.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use commerce_types::EntityType;

/// Key under which a record's metadata is cached.
pub fn metadata_key(entity_type: EntityType, business_key: &str) -> String {
    format!("service:commerce:{entity_type}:{business_key}:metadata")
}

/// Key/value cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
}

#[derive(Debug, thiserror::Error)]
#[error("cache unavailable: {0}")]
pub struct CacheError(pub String);

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Process-local [`Cache`]. Expired entries are dropped lazily on read and
/// swept when the map grows past `max_entries`.
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    max_entries: usize,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            entries.retain(|_, e| e.expires_at > now);
            if entries.len() >= self.max_entries {
                return Err(CacheError(format!("full ({} entries)", self.max_entries)));
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return Ok(None),
                Some(e) if e.expires_at > now => return Ok(Some(e.value.clone())),
                Some(_) => {}
            }
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn metadata_key_shape() {
        assert_eq!(
            metadata_key(EntityType::Quote, "u1:p1:20260101120000.000001"),
            "service:commerce:quote:u1:p1:20260101120000.000001:metadata"
        );
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = InMemoryCache::new();
        cache.put("k", json!({"a": 1}), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_vanish() {
        let cache = InMemoryCache::new();
        cache.put("k", json!(1), Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn full_cache_sweeps_then_refuses() {
        let cache = InMemoryCache::with_capacity(2);
        cache.put("a", json!(1), Duration::ZERO).await.unwrap();
        cache.put("b", json!(2), Duration::from_secs(60)).await.unwrap();
        cache.put("c", json!(3), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.put("d", json!(4), Duration::from_secs(60)).await.is_err());
        cache.put("b", json!(5), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("b").await.unwrap(), Some(json!(5)));
    }
}

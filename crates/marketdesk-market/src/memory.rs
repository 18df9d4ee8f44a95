use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// In-memory hot cache for live upstream responses, backed by moka.
///
/// Values are stored as serialized JSON so one cache can hold quotes,
/// series and chains. Entries are evicted after the TTL or when the
/// capacity bound is reached.
pub struct MemoryCache {
    inner: Cache<String, String>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Typed read. An entry that no longer deserializes is treated as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.inner.get(key).await?;
        serde_json::from_str(&json).ok()
    }

    pub async fn insert<T: Serialize>(&self, key: String, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            self.inner.insert(key, json).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_get() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));
        cache.insert("key1".to_string(), &vec![1.5, 2.5]).await;

        let result: Option<Vec<f64>> = cache.get("key1").await;
        assert_eq!(result, Some(vec![1.5, 2.5]));
    }

    #[tokio::test]
    async fn get_missing() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));
        let result: Option<String> = cache.get("nonexistent").await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn type_mismatch_is_a_miss() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));
        cache.insert("key1".to_string(), &"text").await;

        let result: Option<Vec<f64>> = cache.get("key1").await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn ttl_expiration() {
        let cache = MemoryCache::new(100, Duration::from_millis(50));
        cache.insert("key1".to_string(), &1u32).await;

        assert!(cache.get::<u32>("key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get::<u32>("key1").await.is_none());
    }
}

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A cache entry with expiration time
pub struct CacheEntry<T> {
    pub data: T,
    pub expires_at: Instant,
}

/// A generic time-based cache with TTL support and refresh bookkeeping
/// for the background refresher: a key reports `needs_refresh` when it
/// is missing or close to expiry, and `try_start_refresh` guarantees a
/// single refresher per key.
pub struct TimedCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    refreshing: RwLock<HashSet<String>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync> TimedCache<T> {
    /// Create a new cache with the specified TTL in seconds
    pub fn new(ttl_seconds: u64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_seconds))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refreshing: RwLock::new(HashSet::new()),
            ttl,
        }
    }

    /// Get a value from the cache if it exists and hasn't expired
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        if let Some(entry) = entries.get(key) {
            if Instant::now() < entry.expires_at {
                return Some(entry.data.clone());
            }
        }
        None
    }

    /// Store a value in the cache with the configured TTL
    pub async fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove a specific key from the cache
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Whether a key is missing, expired, or inside the last quarter of
    /// its TTL and should be refreshed proactively.
    pub async fn needs_refresh(&self, key: &str) -> bool {
        let margin = self.ttl / 4;
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => {
                entry.expires_at.saturating_duration_since(Instant::now())
                    <= margin
            },
            None => true,
        }
    }

    /// Try to claim the refresh of a key. Returns false when another
    /// refresher already holds it.
    pub async fn try_start_refresh(&self, key: &str) -> bool {
        let mut refreshing = self.refreshing.write().await;
        refreshing.insert(key.to_string())
    }

    /// Release the refresh claim of a key
    pub async fn finish_refresh(&self, key: &str) {
        let mut refreshing = self.refreshing.write().await;
        refreshing.remove(key);
    }
}

impl<T> std::fmt::Debug for TimedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit() {
        let cache: TimedCache<i32> = TimedCache::new(60);

        assert_eq!(cache.get("key1").await, None);
        cache.set("key1", 42).await;
        assert_eq!(cache.get("key1").await, Some(42));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache: TimedCache<i32> =
            TimedCache::with_ttl(Duration::from_millis(50));

        cache.set("ttl_key", 1).await;
        assert_eq!(cache.get("ttl_key").await, Some(1));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get("ttl_key").await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_the_key() {
        let cache: TimedCache<i32> = TimedCache::new(60);

        cache.set("key", 7).await;
        cache.invalidate("key").await;
        assert_eq!(cache.get("key").await, None);
    }

    #[tokio::test]
    async fn missing_and_stale_keys_need_refresh() {
        let cache: TimedCache<i32> =
            TimedCache::with_ttl(Duration::from_millis(400));

        assert!(cache.needs_refresh("key").await);

        cache.set("key", 1).await;
        assert!(!cache.needs_refresh("key").await);

        // Past the margin the key asks for a refresh while still serving
        tokio::time::sleep(Duration::from_millis(320)).await;
        assert!(cache.needs_refresh("key").await);
        assert_eq!(cache.get("key").await, Some(1));
    }

    #[tokio::test]
    async fn only_one_refresher_claims_a_key() {
        let cache: TimedCache<i32> = TimedCache::new(60);

        assert!(cache.try_start_refresh("key").await);
        assert!(!cache.try_start_refresh("key").await);

        cache.finish_refresh("key").await;
        assert!(cache.try_start_refresh("key").await);
    }
}

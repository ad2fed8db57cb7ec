//! TTL result cache
//!
//! Keeps the last successful fetch result per (fetcher, team) fingerprint
//! so the retry policy can substitute slightly stale data when an upstream
//! is down. Constructed once at startup and passed into the refresh worker;
//! there are no process-wide cache globals.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::data_fetcher::models::ScoreboardData;

/// One cached fetch result with its freshness bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: ScoreboardData,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(value: ScoreboardData, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
            ttl,
        }
    }

    pub fn age(&self) -> Duration {
        self.cached_at.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.age() > self.ttl
    }

    /// Expired against the entry's own TTL, or against a caller-supplied
    /// stricter bound
    fn is_stale(&self, max_age: Option<Duration>) -> bool {
        if self.is_expired() {
            return true;
        }
        max_age.is_some_and(|bound| self.age() > bound)
    }
}

/// Counters exposed for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

pub struct ResultCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Stores a fresh result, overwriting any previous entry for the key
    pub async fn insert(&self, key: impl Into<String>, value: ScoreboardData, ttl: Duration) {
        let key = key.into();
        debug!("Caching result: key={}, ttl={:?}", key, ttl);
        let mut entries = self.entries.write().await;
        entries.put(key, CacheEntry::new(value, ttl));
    }

    /// Retrieves a cached result if it is still fresh.
    ///
    /// Eviction is lazy: a read past the entry's TTL, or past `max_age`
    /// when that bound is stricter, removes the entry and returns `None`.
    pub async fn get(&self, key: &str, max_age: Option<Duration>) -> Option<ScoreboardData> {
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get(key) {
            if !entry.is_stale(max_age) {
                debug!("Cache hit: key={}, age={:?}", key, entry.age());
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            warn!(
                "Removing stale cache entry: key={}, age={:?}, ttl={:?}",
                key,
                entry.age(),
                entry.ttl
            );
            entries.pop(key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Drops one entry, or everything when no key is given
    pub async fn clear(&self, key: Option<&str>) {
        let mut entries = self.entries.write().await;
        match key {
            Some(key) => {
                entries.pop(key);
            }
            None => entries.clear(),
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::{League, TeamDescriptor};

    fn sample_value() -> ScoreboardData {
        let mut data = ScoreboardData::not_fetched(&TeamDescriptor::new("Test Team", League::Nhl));
        data.has_data = true;
        data.base.home_score = "3".to_string();
        data
    }

    #[tokio::test]
    async fn test_insert_then_get_within_ttl() {
        let cache = ResultCache::new(8);
        cache
            .insert("k", sample_value(), Duration::from_secs(60))
            .await;

        let value = cache.get("k", None).await.expect("entry should be fresh");
        assert_eq!(value.base.home_score, "3");

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_get_past_ttl_purges_entry() {
        let cache = ResultCache::new(8);
        cache
            .insert("k", sample_value(), Duration::from_millis(0))
            .await;

        // Zero TTL: already expired on the next read
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("k", None).await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 0, "expired entry should be purged");
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_stricter_max_age_wins_over_ttl() {
        let cache = ResultCache::new(8);
        cache
            .insert("k", sample_value(), Duration::from_secs(3600))
            .await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(
            cache.get("k", Some(Duration::from_millis(1))).await.is_none(),
            "entry within TTL but older than max_age must not be returned"
        );
        // Per the lazy-eviction contract the violating read removed it
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache = ResultCache::new(8);
        cache
            .insert("k", sample_value(), Duration::from_secs(60))
            .await;

        let mut newer = sample_value();
        newer.base.home_score = "4".to_string();
        cache.insert("k", newer, Duration::from_secs(60)).await;

        let value = cache.get("k", None).await.unwrap();
        assert_eq!(value.base.home_score, "4");
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_clear_single_key_and_all() {
        let cache = ResultCache::new(8);
        cache
            .insert("a", sample_value(), Duration::from_secs(60))
            .await;
        cache
            .insert("b", sample_value(), Duration::from_secs(60))
            .await;

        cache.clear(Some("a")).await;
        assert!(cache.get("a", None).await.is_none());
        assert!(cache.get("b", None).await.is_some());

        cache.clear(None).await;
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_independent_instances_do_not_share_state() {
        let first = ResultCache::new(8);
        let second = ResultCache::new(8);
        first
            .insert("k", sample_value(), Duration::from_secs(60))
            .await;

        assert!(first.get("k", None).await.is_some());
        assert!(second.get("k", None).await.is_none());
    }
}

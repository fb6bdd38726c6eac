use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use parking_lot::RwLock;
use lru::LruCache;
use chrono::{DateTime, Utc};
use tracing::debug;
use crate::config::CacheConfig;
use crate::error::Result;
use super::CacheBackend;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|duration| {
            Utc::now() + chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::seconds(300))
        });

        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Utc::now() > expires_at
        } else {
            false
        }
    }
}

/// In-process LRU cache with per-entry expiry.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    cache: Arc<RwLock<LruCache<String, CacheEntry>>>,
    ttl: Option<Duration>,
    last_cleanup: Arc<RwLock<Instant>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_size).unwrap_or(NonZeroUsize::MIN);
        let ttl = match config.default_ttl_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        };

        Self {
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl,
            last_cleanup: Arc::new(RwLock::new(Instant::now())),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    fn cleanup_expired_if_needed(&self) {
        const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

        let now = Instant::now();
        let mut last_cleanup = self.last_cleanup.write();

        if now.duration_since(*last_cleanup) > CLEANUP_INTERVAL {
            *last_cleanup = now;
            drop(last_cleanup);

            let mut cache = self.cache.write();
            let expired: Vec<String> = cache
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect();
            for key in &expired {
                cache.pop(key);
            }
            debug!("Cleaned up {} expired cache entries", expired.len());
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = CacheEntry::new(value.to_string(), self.ttl);
        self.cache.write().put(key.to_string(), entry);
        debug!("Cached value for key: {} (TTL: {:?})", key, self.ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.cleanup_expired_if_needed();

        let mut cache = self.cache.write();
        let expired = match cache.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(key);
            debug!("Cache entry expired for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.cache.write().pop(key).is_some();
        if removed {
            debug!("Removed cache entry for key: {}", key);
        }
        Ok(removed)
    }
}

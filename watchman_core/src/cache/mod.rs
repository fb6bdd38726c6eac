//! Cache backends the cache probe can exercise

pub mod memory;

pub use memory::MemoryCache;

use crate::error::{Result, WatchmanError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Cache handles addressed by their configured name.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: BTreeMap<String, Arc<dyn CacheBackend>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache<C: CacheBackend + 'static>(mut self, name: impl Into<String>, cache: C) -> Self {
        self.insert(name, Arc::new(cache));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, cache: Arc<dyn CacheBackend>) {
        self.caches.insert(name.into(), cache);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn CacheBackend>> {
        self.caches
            .get(name)
            .cloned()
            .ok_or_else(|| WatchmanError::UnknownCache(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = CacheRegistry::new().with_cache("default", MemoryCache::default());

        assert!(registry.get("default").is_ok());
        assert!(matches!(
            registry.get("sessions"),
            Err(WatchmanError::UnknownCache(name)) if name == "sessions"
        ));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["default"]);
    }
}

use super::CacheStore;
use crate::errors::CacheError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

static SHARED: Lazy<Arc<MemoryCache>> = Lazy::new(|| Arc::new(MemoryCache::new()));

/// In-process store. No eviction: entries live as long as the cache does.
#[derive(Default)]
pub struct MemoryCache {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// One cache for the whole process.
    pub fn shared() -> Arc<MemoryCache> {
        Arc::clone(&SHARED)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.inner.write().map_err(|_| CacheError::Poisoned)?.clear();
        Ok(())
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        self.inner
            .read()
            .map_err(|_| CacheError::Poisoned)?
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.inner
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }
}

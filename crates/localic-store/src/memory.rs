//! In-memory cache store for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::*;

/// In-memory cache store (for testing and ephemeral use).
#[derive(Default)]
pub struct MemoryCacheStore {
    cache: Mutex<ContractCache>,
    saves: AtomicUsize,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: ContractCache) -> Self {
        Self {
            cache: Mutex::new(cache),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of times the record has been persisted.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self) -> Result<ContractCache> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| LocalicError::Other("cache lock poisoned".into()))?;
        Ok(cache.clone())
    }

    async fn save(&self, cache: &ContractCache) -> Result<()> {
        let mut stored = self
            .cache
            .lock()
            .map_err(|_| LocalicError::Other("cache lock poisoned".into()))?;
        *stored = cache.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

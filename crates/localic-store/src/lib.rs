//! Content-addressed contract upload cache.
//!
//! Defines the `CacheStore` trait over the persisted `contracts.json` record.
//! Provides a `FileCacheStore` for real runs and a `MemoryCacheStore` for testing.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;
use localic_types::{CodeId, LocalicError, Result};

pub mod file;
pub mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Persisted cache record, tied to one chain start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCache {
    #[serde(default)]
    pub start_time: u64,
    /// sha1 hex digest -> code id
    #[serde(default)]
    pub file_cache: BTreeMap<String, CodeId>,
}

impl ContractCache {
    pub fn new(start_time: u64) -> Self {
        Self {
            start_time,
            file_cache: BTreeMap::new(),
        }
    }

    /// A record with no start time, or one from another chain instance, is stale.
    pub fn is_stale(&self, chain_start_time: u64) -> bool {
        self.start_time == 0 || self.start_time != chain_start_time
    }

    pub fn code_id(&self, hash: &str) -> Option<CodeId> {
        self.file_cache.get(hash).copied()
    }
}

/// Storage for the contract cache record.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self) -> Result<ContractCache>;
    async fn save(&self, cache: &ContractCache) -> Result<()>;

    async fn is_stale(&self, chain_start_time: u64) -> Result<bool> {
        Ok(self.load().await?.is_stale(chain_start_time))
    }

    /// Load the record, resetting and persisting it first if it is stale.
    async fn get_cache_or_default(&self, chain_start_time: u64) -> Result<ContractCache> {
        let cache = self.load().await?;
        if !cache.is_stale(chain_start_time) {
            return Ok(cache);
        }

        tracing::debug!(
            old = cache.start_time,
            new = chain_start_time,
            "resetting stale contract cache"
        );
        let fresh = ContractCache::new(chain_start_time);
        self.save(&fresh).await?;
        Ok(fresh)
    }

    /// Record `hash -> code_id` and persist immediately.
    async fn upsert(&self, cache: &mut ContractCache, hash: &str, code_id: CodeId) -> Result<CodeId> {
        cache.file_cache.insert(hash.to_string(), code_id);
        self.save(cache).await?;
        Ok(code_id)
    }
}

/// SHA-1 of the chain id (dashes stripped) followed by the file contents.
///
/// Used for change detection only.
pub async fn get_file_hash(path: &Path, chain_id: &str) -> Result<String> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(LocalicError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut hasher = Sha1::new();
    hasher.update(chain_id.replace('-', "").as_bytes());

    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Read the chain start time from the harness `logs.json`.
///
/// Returns `None` when the file or its `start_time` field is missing.
pub async fn chain_start_time_from_logs(path: &Path) -> Result<Option<u64>> {
    let bz = match tokio::fs::read(path).await {
        Ok(bz) => bz,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let logs: serde_json::Value = serde_json::from_slice(&bz)?;
    let Some(raw) = logs.get("start_time") else {
        return Ok(None);
    };
    let start_time = raw.as_u64();
    if start_time.is_none() {
        tracing::debug!(start_time = %raw, path = %path.display(), "start_time is not a timestamp, treating it as unknown");
    }
    Ok(start_time)
}

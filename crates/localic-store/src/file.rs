//! JSON file cache store (`contracts.json`).

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::*;

/// Cache store backed by a JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a failed write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty record on disk if none exists yet.
    pub async fn ensure_exists(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.save(&ContractCache::default()).await
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contracts.json".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn load(&self) -> Result<ContractCache> {
        let bz = match tokio::fs::read(&self.path).await {
            Ok(bz) => bz,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ContractCache::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bz)?)
    }

    async fn save(&self, cache: &ContractCache) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bz = serde_json::to_vec_pretty(cache)?;
        let tmp = self.temp_path();
        if let Err(e) = tokio::fs::write(&tmp, &bz).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_exists_writes_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("configs").join("contracts.json"));

        store.ensure_exists().await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"start_time": 0, "file_cache": {}}));

        // existing content is left alone
        let mut cache = ContractCache::new(5);
        cache.file_cache.insert("aa".into(), 1);
        store.save(&cache).await.unwrap();
        store.ensure_exists().await.unwrap();
        assert_eq!(store.load().await.unwrap(), cache);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("contracts.json"));

        let mut cache = ContractCache::new(1000);
        cache.file_cache.insert("aa".into(), 3);
        store.save(&cache).await.unwrap();

        // a directory squatting on the temp path makes the write fail
        std::fs::create_dir(dir.path().join(".contracts.json.tmp")).unwrap();
        let mut next = cache.clone();
        next.file_cache.insert("bb".into(), 4);
        assert!(store.save(&next).await.is_err());

        assert_eq!(store.load().await.unwrap(), cache);
    }

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("contracts.json"));
        assert_eq!(store.load().await.unwrap(), ContractCache::default());
        assert!(store.is_stale(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_round_trip_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("contracts.json"));

        let mut cache = store.get_cache_or_default(1000).await.unwrap();
        store.upsert(&mut cache, "deadbeef", 12).await.unwrap();

        let reopened = FileCacheStore::new(store.path());
        let loaded = reopened.get_cache_or_default(1000).await.unwrap();
        assert_eq!(loaded.code_id("deadbeef"), Some(12));

        let reset = reopened.get_cache_or_default(2000).await.unwrap();
        assert_eq!(reset.start_time, 2000);
        assert!(reset.file_cache.is_empty());
        assert!(reopened.load().await.unwrap().file_cache.is_empty());
        assert!(!dir.path().join(".contracts.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_reads_record_written_by_other_tools() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contracts.json");
        std::fs::write(
            &path,
            r#"{
    "start_time": 1700000000,
    "file_cache": {
        "3f786850e387550fdab836ed7e6dc881de23001b": 4
    }
}"#,
        )
        .unwrap();

        let store = FileCacheStore::new(&path);
        let cache = store.get_cache_or_default(1_700_000_000).await.unwrap();
        assert_eq!(cache.code_id("3f786850e387550fdab836ed7e6dc881de23001b"), Some(4));
    }
}

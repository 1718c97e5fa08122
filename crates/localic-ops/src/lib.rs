//! Contract and bank operations on top of the request builder.
//!
//! Coordinates the contract cache, the upload endpoint and the chain binary
//! to store, instantiate, execute and query contracts.

use std::path::Path;
use std::sync::Arc;

use localic_store::{get_file_hash, CacheStore};
use localic_tx::ChainRequestBuilder;
use localic_types::{CodeId, Result};

pub mod bank;
pub mod cosmwasm;

pub use bank::{Bank, Coin};
pub use cosmwasm::{Contract, CosmWasm};

/// Uploads contract binaries, reusing code ids already stored on the running chain.
#[derive(Clone)]
pub struct CodeUploader {
    rb: ChainRequestBuilder,
    store: Arc<dyn CacheStore>,
}

impl CodeUploader {
    pub fn new(rb: ChainRequestBuilder, store: Arc<dyn CacheStore>) -> Self {
        Self { rb, store }
    }

    /// Upload `abs_path` unless the same content was already stored on this
    /// chain instance.
    ///
    /// Without a chain start time there is nothing to key the cache on, so the
    /// file is always uploaded.
    pub async fn upload_or_reuse(
        &self,
        key_name: &str,
        abs_path: &Path,
        chain_start_time: Option<u64>,
    ) -> Result<CodeId> {
        let Some(start_time) = chain_start_time else {
            tracing::debug!(file = %abs_path.display(), "chain start time unknown, uploading without cache");
            return self.rb.upload_contract(key_name, abs_path).await;
        };

        let mut cache = self.store.get_cache_or_default(start_time).await?;
        let hash = get_file_hash(abs_path, self.rb.chain_id()).await?;

        if let Some(code_id) = cache.code_id(&hash) {
            let file = abs_path.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();
            tracing::info!("[Cache] CodeID={} for {}", code_id, file);
            return Ok(code_id);
        }

        let code_id = self.rb.upload_contract(key_name, abs_path).await?;
        self.store.upsert(&mut cache, &hash, code_id).await
    }
}

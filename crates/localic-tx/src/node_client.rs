//! Node information through the `/info` endpoint, plus keyring lookups.
//!
//! GET /info?chain_id=<id>&request=<name>[&extra=...]

use localic_types::{Action, LocalicError, Result};

use crate::ChainRequestBuilder;

/// Reads runtime information about a chain's node.
pub struct NodeInfoClient {
    rb: ChainRequestBuilder,
}

impl NodeInfoClient {
    pub fn new(rb: &ChainRequestBuilder) -> Self {
        Self { rb: rb.clone() }
    }

    /// Raw text answer for an info `request`.
    pub async fn info(&self, request: &str, extra: &[(&str, &str)]) -> Result<String> {
        let mut params = vec![("chain_id", self.rb.chain_id()), ("request", request)];
        params.extend_from_slice(extra);

        let resp = self
            .rb
            .client()
            .get(self.rb.endpoint_url("info"))
            .query(&params)
            .send()
            .await
            .map_err(|e| LocalicError::Request(format!("info request failed: {}", e)))?;

        let text = resp
            .text()
            .await
            .map_err(|e| LocalicError::Request(format!("failed to read info response: {}", e)))?;

        tracing::debug!(request, res = %text, "node info");
        Ok(text)
    }

    pub async fn name(&self) -> Result<String> {
        self.info("name", &[]).await
    }

    pub async fn container_id(&self) -> Result<String> {
        self.info("container_id", &[]).await
    }

    pub async fn host_name(&self) -> Result<String> {
        self.info("hostname", &[]).await
    }

    pub async fn home_dir(&self) -> Result<String> {
        self.info("home_dir", &[]).await
    }

    pub async fn genesis_file_content(&self) -> Result<Option<String>> {
        let res = self.info("genesis_file_content", &[]).await?;
        Ok(Some(res).filter(|r| !r.is_empty()))
    }

    /// Current block height; 0 if the answer is not a number.
    pub async fn height(&self) -> Result<u64> {
        let res = self.info("height", &[]).await?;
        Ok(res.trim().parse().unwrap_or(0))
    }

    /// Read a file relative to the node's home directory.
    pub async fn read_file(&self, relative_path: &str) -> Result<String> {
        self.info("read_file", &[("relative_path", relative_path)]).await
    }

    /// Address of a keyring key with the chain's own prefix.
    pub async fn account_key_bech32(&self, key_name: &str) -> Result<String> {
        self.key_bech32(key_name, "").await
    }

    /// Address of a keyring key; a non-empty `bech_prefix` selects
    /// `acc`, `val` or `cons` style addresses.
    pub async fn key_bech32(&self, key_name: &str, bech_prefix: &str) -> Result<String> {
        let mut cmd = format!("keys show --address {key_name} --home=%HOME% --keyring-backend=test");
        if !bech_prefix.is_empty() {
            cmd.push_str(&format!(" --bech {bech_prefix}"));
        }

        let res = self.rb.send_text(Action::Bin, &cmd).await?;
        let text = res["text"].as_str().unwrap_or_default();
        if text.contains("Error:") {
            return Err(LocalicError::KeyBech32Failed { reason: text.to_string() });
        }

        let address = text.replace(['\n', '"'], "");
        let address = address.trim();
        if address.is_empty() {
            return Err(LocalicError::KeyBech32Failed {
                reason: format!("no address for key {key_name}"),
            });
        }
        Ok(address.to_string())
    }
}

//! Relayer actions, proxied through the REST server.
//!
//! - `relayer-exec`: run a relayer CLI command
//! - `get_channels`: list IBC channels for a chain

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use localic_types::{parse_body, Action, ActionPayload, LocalicError, Result};

use crate::ChainRequestBuilder;

/// Counterparty end of a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub port_id: String,
}

/// An IBC channel as reported by the relayer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub connection_hops: Vec<String>,
    #[serde(default)]
    pub counterparty: Counterparty,
    #[serde(default)]
    pub ordering: String,
    #[serde(default)]
    pub port_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub version: String,
}

/// Relayer client for a single chain.
pub struct RelayerClient {
    api: String,
    chain_id: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RelayerClient {
    pub fn new(rb: &ChainRequestBuilder, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(120_000);
        Self {
            api: rb.api().to_string(),
            chain_id: rb.chain_id().to_string(),
            client: rb.client().clone(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Run a relayer command. A non-JSON body comes back as `{"parse_error": ...}`.
    pub async fn execute(&self, cmd: &str) -> Result<Value> {
        let text = self.post_exec(cmd).await?;
        Ok(parse_body(&text))
    }

    /// Run a relayer command and return the undecoded output as `{"text": ...}`.
    pub async fn execute_text(&self, cmd: &str) -> Result<Value> {
        let text = self.post_exec(cmd).await?;
        Ok(serde_json::json!({ "text": text }))
    }

    async fn post_exec(&self, cmd: &str) -> Result<String> {
        tracing::info!(chain_id = %self.chain_id, cmd, "[relayer]");

        let payload = ActionPayload::new(&self.chain_id, Action::RelayerExec, cmd);
        let resp = self
            .client
            .post(&self.api)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LocalicError::Request(format!("relayer request failed: {}", e)))?;

        resp.text()
            .await
            .map_err(|e| LocalicError::Request(format!("failed to read relayer response: {}", e)))
    }

    /// Relay all pending packets on `channel`.
    pub async fn flush(&self, path: &str, channel: &str) -> Result<Value> {
        self.execute(&format!("rly transact flush {path} {channel}")).await
    }

    /// Open a channel between two contracts' IBC ports.
    ///
    /// Ports are prefixed with `wasm.` unless they already are.
    pub async fn create_wasm_connection(
        &self,
        path: &str,
        src: &str,
        dst: &str,
        order: &str,
        version: &str,
    ) -> Result<Value> {
        let src = wasm_port(src);
        let dst = wasm_port(dst);
        self.execute(&format!(
            "rly tx channel {path} --src-port {src} --dst-port {dst} --order {order} --version {version}"
        ))
        .await
    }

    /// List the channels the relayer knows for `chain_id`.
    pub async fn get_channels(&self, chain_id: &str) -> Result<Vec<Channel>> {
        let payload = ActionPayload::without_cmd(chain_id, Action::GetChannels);
        let resp = self
            .client
            .post(&self.api)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LocalicError::Request(format!("get_channels request failed: {}", e)))?;

        let text = resp
            .text()
            .await
            .map_err(|e| LocalicError::Request(format!("failed to read get_channels response: {}", e)))?;

        serde_json::from_str(&text)
            .map_err(|e| LocalicError::Other(format!("get_channels returned no channel list ({}): {}", e, text)))
    }
}

fn wasm_port(port: &str) -> String {
    if port.starts_with("wasm.") {
        port.to_string()
    } else {
        format!("wasm.{port}")
    }
}

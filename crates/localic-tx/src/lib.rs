//! Request builder and clients for the local-interchain REST server.
//!
//! - Build `{chain_id, action, cmd}` payloads and POST them
//! - Poll the server until it is live
//! - Upload contract binaries
//! - Drive the relayer and read node info

use std::time::Duration;

use serde_json::Value;
use localic_types::{
    extract_transaction_response, parse_body, strip_query_prefix, tx_hash_of, Action,
    ActionPayload, LocalicError, ResponseBody, Result,
};

pub mod node_client;
pub mod polling;
pub mod relayer_client;
pub mod upload;

pub use node_client::NodeInfoClient;
pub use polling::{poll_for_start, poll_for_start_every};
pub use relayer_client::{Channel, Counterparty, RelayerClient};

/// Number of `tx <hash>` lookups before giving up on a transaction.
pub const TX_QUERY_ATTEMPTS: u32 = 5;

/// Builds and sends action requests for a single chain.
#[derive(Debug, Clone)]
pub struct ChainRequestBuilder {
    client: reqwest::Client,
    api: String,
    chain_id: String,
    log_output: bool,
    tx_pause: Duration,
    retry_interval: Duration,
}

impl ChainRequestBuilder {
    /// Fails if `api` or `chain_id` is empty. No request is made.
    pub fn new(api: &str, chain_id: &str) -> Result<Self> {
        if api.is_empty() {
            return Err(LocalicError::EmptyApi);
        }
        if chain_id.is_empty() {
            return Err(LocalicError::EmptyChainId);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api: api.to_string(),
            chain_id: chain_id.to_string(),
            log_output: false,
            tx_pause: Duration::ZERO,
            retry_interval: Duration::from_secs(1),
        })
    }

    /// Log every payload and non-empty response at info level.
    pub fn with_log_output(mut self, log_output: bool) -> Self {
        self.log_output = log_output;
        self
    }

    /// Pause after every command starting with `tx`, giving the chain time to
    /// include the transaction.
    pub fn with_tx_pause(mut self, pause: Duration) -> Self {
        self.tx_pause = pause;
        self
    }

    /// Delay between retries of tx lookups.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// `path` under the API base, joined with exactly one slash.
    pub fn endpoint_url(&self, path: &str) -> String {
        if self.api.ends_with('/') {
            format!("{}{}", self.api, path)
        } else {
            format!("{}/{}", self.api, path)
        }
    }

    /// Run a chain binary subcommand (tx, keys, config, ...).
    pub async fn binary(&self, cmd: &str) -> Result<Value> {
        self.send_request(Action::Bin, cmd).await
    }

    /// Like [`binary`](Self::binary) but never pauses after `tx` commands.
    pub async fn binary_no_pause(&self, cmd: &str) -> Result<Value> {
        let text = self.post_action(Action::Bin, cmd, false).await?;
        Ok(parse_body(&text))
    }

    /// Run a read-only query. A leading `query ` or `q ` is dropped.
    pub async fn query(&self, cmd: &str) -> Result<Value> {
        self.send_request(Action::Query, cmd).await
    }

    /// Run a generic command inside the node container.
    pub async fn exec(&self, cmd: &str) -> Result<Value> {
        self.send_request(Action::Exec, cmd).await
    }

    /// Send an action and decode the JSON response.
    ///
    /// A body that is not JSON comes back as `{"parse_error": <text>}`.
    pub async fn send_request(&self, action: Action, cmd: &str) -> Result<Value> {
        let text = self.post_action(action, cmd, true).await?;
        Ok(parse_body(&text))
    }

    /// Send an action and return the undecoded body as `{"text": <body>}`.
    pub async fn send_text(&self, action: Action, cmd: &str) -> Result<Value> {
        let text = self.post_action(action, cmd, true).await?;
        Ok(serde_json::json!({ "text": text }))
    }

    async fn post_action(&self, action: Action, cmd: &str, allow_pause: bool) -> Result<String> {
        let cmd = match action {
            Action::Query => strip_query_prefix(cmd),
            _ => cmd,
        };
        let payload = ActionPayload::new(&self.chain_id, action, cmd);

        if self.log_output {
            tracing::info!(chain_id = %self.chain_id, %action, cmd, "[send_request data]");
        } else {
            tracing::debug!(chain_id = %self.chain_id, %action, cmd, "[send_request data]");
        }

        let resp = self
            .client
            .post(&self.api)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LocalicError::Request(format!("{} request failed: {}", action, e)))?;

        let text = resp
            .text()
            .await
            .map_err(|e| LocalicError::Request(format!("failed to read {} response: {}", action, e)))?;

        if allow_pause && cmd.starts_with("tx") && !self.tx_pause.is_zero() {
            tokio::time::sleep(self.tx_pause).await;
        }

        if text != "{}" {
            if self.log_output {
                tracing::info!(%action, body = %text, "[send_request resp]");
            } else {
                tracing::debug!(%action, body = %text, "[send_request resp]");
            }
        }

        Ok(text)
    }

    /// Look up the transaction behind a previous `tx` response.
    ///
    /// Returns `{"tx": <query result>}`, or `{"error": ...}` without making a
    /// request when the response carries no hash.
    pub async fn query_tx(&self, response: &Value) -> Result<Value> {
        let tx = extract_transaction_response(&ResponseBody::from(response.clone()))?;
        if tx.tx_hash.is_empty() {
            return Ok(serde_json::json!({ "error": "tx_hash is empty" }));
        }

        let res = self.query_tx_hash(&tx.tx_hash).await?;
        Ok(serde_json::json!({ "tx": res }))
    }

    /// `tx <hash> --output=json` query.
    pub async fn query_tx_hash(&self, tx_hash: &str) -> Result<Value> {
        if tx_hash.is_empty() {
            return Ok(serde_json::json!({ "error": "tx_hash cannot be empty" }));
        }
        self.query(&format!("tx {tx_hash} --output=json")).await
    }

    /// Send a `tx` command; with `get_data`, wait for and return the included tx.
    pub async fn transaction(&self, cmd: &str, get_data: bool) -> Result<Value> {
        let res = self.binary(cmd).await?;
        if !get_data {
            return Ok(res);
        }

        let tx_hash = tx_hash_of(&res).ok_or_else(|| LocalicError::TxHashNotFound(res.to_string()))?;

        for attempt in 0..TX_QUERY_ATTEMPTS {
            let data = self.query_tx_hash(&tx_hash).await?;
            if data.get("error").is_none() {
                return Ok(data);
            }
            if attempt + 1 < TX_QUERY_ATTEMPTS {
                tokio::time::sleep(self.retry_interval).await;
            }
        }

        Err(LocalicError::TxHashNotFound(format!(
            "tx {} not found after {} attempts",
            tx_hash, TX_QUERY_ATTEMPTS
        )))
    }

    /// Decode a base64 (or hex) encoded transaction.
    pub async fn decode_transaction(&self, tx_bytes: &str, use_hex: bool) -> Result<Value> {
        let mut cmd = format!("tx decode {tx_bytes}");
        if use_hex {
            cmd.push_str(" --hex");
        }
        self.binary_no_pause(&cmd).await
    }

    /// The SDK status `code` of a tx response.
    pub fn get_sdk_status_code(&self, tx_res: &Value) -> Result<u64> {
        tx_res["code"]
            .as_u64()
            .ok_or_else(|| LocalicError::SdkStatusCodeNotFound(tx_res.to_string()))
    }
}

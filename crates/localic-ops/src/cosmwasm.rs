//! CosmWasm contract lifecycle: store, instantiate, execute, query.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use localic_store::{chain_start_time_from_logs, CacheStore};
use localic_tx::ChainRequestBuilder;
use localic_types::{
    extract_transaction_response, raw_log_of, CodeId, LocalicError, ResponseBody, Result,
    TransactionResponse,
};

use crate::CodeUploader;

/// Flags shared by contract transactions. `%HOME%`, `%RPC%` and `%CHAIN_ID%`
/// are filled in by the server.
pub const DEFAULT_TX_FLAGS: &str = "--home=%HOME% --node=%RPC% --chain-id=%CHAIN_ID% --yes --output=json --keyring-backend=test --gas=auto --gas-adjustment=2.0";

/// Attempts at resolving a contract address from its instantiate tx.
const CONTRACT_ADDRESS_ATTEMPTS: u32 = 5;

/// An instantiated contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub address: String,
    pub tx_hash: String,
    pub admin: Option<String>,
}

/// A contract on one chain, from upload to execution.
pub struct CosmWasm {
    rb: ChainRequestBuilder,
    uploader: CodeUploader,
    logs_path: PathBuf,

    pub file_path: Option<PathBuf>,
    pub code_id: Option<CodeId>,
    pub contract_addr: Option<String>,
    /// Hash of the last transaction sent for this contract.
    pub tx_hash: String,
}

impl CosmWasm {
    /// `logs_path` is the harness `logs.json` holding the chain start time.
    pub fn new(rb: ChainRequestBuilder, store: Arc<dyn CacheStore>, logs_path: impl Into<PathBuf>) -> Self {
        Self {
            uploader: CodeUploader::new(rb.clone(), store),
            rb,
            logs_path: logs_path.into(),
            file_path: None,
            code_id: None,
            contract_addr: None,
            tx_hash: String::new(),
        }
    }

    /// Use an already stored or instantiated contract.
    pub fn with_existing(mut self, code_id: Option<CodeId>, contract_addr: Option<String>) -> Self {
        self.code_id = code_id;
        self.contract_addr = contract_addr;
        self
    }

    pub fn request_builder(&self) -> &ChainRequestBuilder {
        &self.rb
    }

    /// Store the contract binary, reusing a cached code id when possible.
    pub async fn store(&mut self, key_name: &str, abs_path: &Path) -> Result<CodeId> {
        let start_time = chain_start_time_from_logs(&self.logs_path).await?;
        let code_id = self.uploader.upload_or_reuse(key_name, abs_path, start_time).await?;

        self.code_id = Some(code_id);
        self.file_path = Some(abs_path.to_path_buf());
        Ok(code_id)
    }

    /// Instantiate the stored code and resolve the new contract's address.
    pub async fn instantiate(
        &mut self,
        account_key: &str,
        msg: &Value,
        label: &str,
        admin: Option<&str>,
        flags: &str,
    ) -> Result<Contract> {
        if self.contract_addr.is_some() {
            return Err(LocalicError::Other("contract address already set".into()));
        }
        let code_id = self
            .code_id
            .ok_or_else(|| LocalicError::Other("contract code_id is not set, store it first".into()))?;

        let mut cmd = format!(
            "tx wasm instantiate {code_id} {msg} --label={label} --from={account_key} {DEFAULT_TX_FLAGS}",
            msg = compact(msg)?,
        );
        let admin_flags = admin_flags(admin, flags);
        if !admin_flags.is_empty() {
            cmd.push(' ');
            cmd.push_str(&admin_flags);
        }

        let res = self.rb.binary(&cmd).await?;
        let tx = log_tx_response(&res)?;
        check_broadcast_code(&res)?;
        if tx.tx_hash.is_empty() {
            return Err(LocalicError::TxHashNotFound(res.to_string()));
        }

        let address = get_contract_address(&self.rb, &tx.tx_hash).await?;
        tracing::info!(label, %address, "[instantiate_contract]");

        self.tx_hash = tx.tx_hash.clone();
        self.contract_addr = Some(address.clone());
        Ok(Contract {
            address,
            tx_hash: tx.tx_hash,
            admin: admin.map(str::to_string),
        })
    }

    /// Execute a message against the contract.
    pub async fn execute(&mut self, account_key: &str, msg: &Value, flags: &str) -> Result<TransactionResponse> {
        let address = self.address()?;
        let mut cmd = format!(
            "tx wasm execute {address} {msg} --from={account_key} --keyring-backend=test --home=%HOME% --node=%RPC% --chain-id=%CHAIN_ID% --yes --gas=auto --gas-adjustment=2.0",
            msg = compact(msg)?,
        );
        if !flags.trim().is_empty() {
            cmd.push(' ');
            cmd.push_str(flags.trim());
        }
        tracing::debug!(%cmd, "[execute_contract]");

        let res = self.rb.binary(&cmd).await?;
        let tx = log_tx_response(&res)?;
        self.tx_hash = tx.tx_hash.clone();
        Ok(tx)
    }

    /// Smart query against the contract.
    pub async fn query(&self, msg: &Value) -> Result<Value> {
        let address = self.address()?;
        let cmd = format!(
            "query wasm contract-state smart {address} {msg} --output=json",
            msg = compact(msg)?
        );
        self.rb.query(&cmd).await
    }

    fn address(&self) -> Result<&str> {
        self.contract_addr
            .as_deref()
            .ok_or_else(|| LocalicError::Other("contract address is not set, instantiate first".into()))
    }
}

/// Resolve the address created by an instantiate tx, waiting for the tx to land.
pub async fn get_contract_address(rb: &ChainRequestBuilder, tx_hash: &str) -> Result<String> {
    let mut last_error = LocalicError::ContractAddressNotFound(tx_hash.to_string());
    for attempt in 0..CONTRACT_ADDRESS_ATTEMPTS {
        let res = rb.query_tx_hash(tx_hash).await?;
        match contract_address_from_tx(&res) {
            Ok(address) => return Ok(address),
            Err(e @ LocalicError::TxNotSuccessful { .. }) => return Err(e),
            Err(e) => last_error = e,
        }
        if attempt + 1 < CONTRACT_ADDRESS_ATTEMPTS {
            tokio::time::sleep(rb.retry_interval()).await;
        }
    }
    Err(last_error)
}

/// Find the `_contract_address` event attribute in a queried tx.
///
/// Looks in both `logs[].events` and top-level `events`, since SDK versions
/// differ in where they report them.
pub fn contract_address_from_tx(res: &Value) -> Result<String> {
    if res.get("error").is_some() || res.get("parse_error").is_some() {
        return Err(LocalicError::ContractAddressNotFound(res.to_string()));
    }

    let code = res["code"].as_i64().unwrap_or_default();
    if code != 0 {
        return Err(LocalicError::TxNotSuccessful {
            code,
            raw_log: res["raw_log"].as_str().unwrap_or_default().to_string(),
        });
    }

    let log_events = res["logs"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|log| log["events"].as_array())
        .flatten();
    let tx_events = res["events"].as_array().into_iter().flatten();

    log_events
        .chain(tx_events)
        .filter_map(|event| event["attributes"].as_array())
        .flatten()
        .find(|attr| {
            attr["key"]
                .as_str()
                .is_some_and(|key| key.contains("contract_address"))
        })
        .and_then(|attr| attr["value"].as_str())
        .map(str::to_string)
        .ok_or_else(|| LocalicError::ContractAddressNotFound(res.to_string()))
}

/// A non-zero `code` in a broadcast response means CheckTx rejected the tx;
/// it will never be included.
fn check_broadcast_code(res: &Value) -> Result<()> {
    match res["code"].as_i64() {
        Some(code) if code != 0 => Err(LocalicError::TxNotSuccessful {
            code,
            raw_log: res["raw_log"].as_str().unwrap_or_default().to_string(),
        }),
        _ => Ok(()),
    }
}

fn admin_flags(admin: Option<&str>, flags: &str) -> String {
    let flags = flags.trim();
    let extra = match admin {
        Some(admin) => format!("--admin={admin}"),
        None if !flags.contains("--no-admin") => "--no-admin".to_string(),
        None => String::new(),
    };
    [flags, extra.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn compact(msg: &Value) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

fn log_tx_response(res: &Value) -> Result<TransactionResponse> {
    let tx = extract_transaction_response(&ResponseBody::from(res.clone()))?;
    if let Some(raw_log) = raw_log_of(res) {
        tracing::warn!(tx_hash = %tx.tx_hash, %raw_log, "transaction raw log");
    }
    if tx.tx_hash.is_empty() {
        tracing::warn!(response = %res, "tx execute error");
    }
    Ok(tx)
}

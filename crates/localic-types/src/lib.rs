use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod response;

pub use response::{
    extract_transaction_response, parse_body, raw_log_of, tx_hash_of, ResponseBody,
    TransactionResponse,
};

/// Local-interchain client error types.
#[derive(Debug, Error)]
pub enum LocalicError {
    #[error("api url cannot be empty")]
    EmptyApi,

    #[error("chain_id cannot be empty")]
    EmptyChainId,

    #[error("server at {url} did not start after {attempts} attempts")]
    ServerNotStarted { url: String, attempts: u32 },

    #[error("request failed: {0}")]
    Request(String),

    #[error("no txhash found in response: {0}")]
    TxHashNotFound(String),

    #[error("'code' not found in tx response: {0}")]
    SdkStatusCodeNotFound(String),

    #[error("transaction failed with code {code}: {raw_log}")]
    TxNotSuccessful { code: i64, raw_log: String },

    #[error("contract address not found in tx events: {0}")]
    ContractAddressNotFound(String),

    #[error("upload of {path} failed: {reason}")]
    UploadFailed { path: String, reason: String },

    #[error("key bech32 lookup failed: {reason}")]
    KeyBech32Failed { reason: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LocalicError>;

/// Code id assigned by the chain to a stored contract binary.
pub type CodeId = u64;

/// Action understood by the local-interchain REST server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "bin")]
    Bin,
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "exec")]
    Exec,
    #[serde(rename = "relayer-exec")]
    RelayerExec,
    #[serde(rename = "get_channels")]
    GetChannels,
    #[serde(rename = "upload")]
    Upload,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Bin => "bin",
            Action::Query => "query",
            Action::Exec => "exec",
            Action::RelayerExec => "relayer-exec",
            Action::GetChannels => "get_channels",
            Action::Upload => "upload",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of every action POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub chain_id: String,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
}

impl ActionPayload {
    pub fn new(chain_id: impl Into<String>, action: Action, cmd: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            action,
            cmd: Some(cmd.into()),
        }
    }

    /// Payload for actions that take no command, such as `get_channels`.
    pub fn without_cmd(chain_id: impl Into<String>, action: Action) -> Self {
        Self {
            chain_id: chain_id.into(),
            action,
            cmd: None,
        }
    }
}

/// Body of a POST to the `/upload` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub chain_id: String,
    pub key_name: String,
    pub file_name: String,
}

/// Strip one leading `query ` or `q ` token (ASCII case-insensitive).
pub fn strip_query_prefix(cmd: &str) -> &str {
    for prefix in ["query ", "q "] {
        let matches = cmd
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return &cmd[prefix.len()..];
        }
    }
    cmd
}

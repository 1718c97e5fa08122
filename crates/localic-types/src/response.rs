//! Response normalization for the local-interchain REST server.
//!
//! Server responses are whatever the chain CLI printed: usually a JSON
//! object, sometimes plain text. `ResponseBody` captures both shapes so the
//! transaction extraction logic lives in one place.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{LocalicError, Result};

/// A raw server response, either undecoded text or a decoded JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    RawText(String),
    Decoded(Map<String, Value>),
}

impl From<Value> for ResponseBody {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ResponseBody::Decoded(map),
            Value::String(text) => ResponseBody::RawText(text),
            other => ResponseBody::RawText(other.to_string()),
        }
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::RawText(text)
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        ResponseBody::RawText(text.to_string())
    }
}

/// Normalized transaction result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Empty when the server returned no hash.
    pub tx_hash: String,
    pub raw_log: Option<String>,
}

/// Extract the tx hash and raw log from a server response.
///
/// Text that does not decode to a JSON object is taken as the raw log with an
/// empty hash. Text that does decode must carry a string `txhash`; a decoded
/// object without one is a malformed server response. Already-decoded objects
/// default the hash to empty.
pub fn extract_transaction_response(body: &ResponseBody) -> Result<TransactionResponse> {
    match body {
        ResponseBody::RawText(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => {
                let tx_hash = map
                    .get("txhash")
                    .and_then(Value::as_str)
                    .ok_or_else(|| LocalicError::TxHashNotFound(text.clone()))?;
                Ok(TransactionResponse {
                    tx_hash: tx_hash.to_string(),
                    raw_log: string_field(&map, "raw_log"),
                })
            }
            _ => Ok(TransactionResponse {
                tx_hash: String::new(),
                raw_log: Some(text.clone()),
            }),
        },
        ResponseBody::Decoded(map) => Ok(TransactionResponse {
            tx_hash: string_field(map, "txhash").unwrap_or_default(),
            raw_log: string_field(map, "raw_log"),
        }),
    }
}

/// Parse a response body, degrading to `{"parse_error": text}` when it is not JSON.
pub fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "parse_error": text }))
}

/// The `txhash` of a decoded tx response, if present.
pub fn tx_hash_of(value: &Value) -> Option<String> {
    value["txhash"].as_str().map(str::to_string)
}

/// The `raw_log` of a decoded tx response, skipping empty and `[]` logs.
pub fn raw_log_of(value: &Value) -> Option<String> {
    value["raw_log"]
        .as_str()
        .filter(|log| !log.is_empty() && *log != "[]")
        .map(str::to_string)
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

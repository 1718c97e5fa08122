//! Contract upload through the `/upload` endpoint.
//!
//! POST /upload {chain_id, key_name, file_name} -> {"code_id": N} | {"error": "..."}

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use localic_types::{CodeId, LocalicError, Result, UploadPayload};

use crate::ChainRequestBuilder;

pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

impl ChainRequestBuilder {
    pub fn upload_url(&self) -> String {
        self.endpoint_url("upload")
    }

    /// Transfer and store a contract binary, returning its code id.
    ///
    /// Fails if the file is missing locally, the server answers with a
    /// non-success status, or the body carries an `error`.
    pub async fn upload_contract(&self, key_name: &str, abs_path: &Path) -> Result<CodeId> {
        let file_name = abs_path.to_string_lossy().into_owned();
        if !tokio::fs::try_exists(abs_path).await? {
            return Err(LocalicError::FileNotFound(abs_path.to_path_buf()));
        }

        tracing::info!(chain_id = self.chain_id(), file = %file_name, "[upload_file]");

        let payload = UploadPayload {
            chain_id: self.chain_id().to_string(),
            key_name: key_name.to_string(),
            file_name: file_name.clone(),
        };

        let upload_failed = |reason: String| LocalicError::UploadFailed {
            path: file_name.clone(),
            reason,
        };

        let resp = self
            .client()
            .post(self.upload_url())
            .json(&payload)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| upload_failed(e.to_string()))?;
        if !status.is_success() {
            return Err(upload_failed(format!("status {}: {}", status, text)));
        }

        let body: Value =
            serde_json::from_str(&text.replace('\n', "")).map_err(|e| upload_failed(e.to_string()))?;

        if let Some(err) = body.get("error") {
            let reason = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
            return Err(upload_failed(reason));
        }

        parse_code_id(&body["code_id"]).ok_or_else(|| upload_failed(format!("code_id not found in {}", text)))
    }
}

fn parse_code_id(value: &Value) -> Option<CodeId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_code_id() {
        assert_eq!(parse_code_id(&json!(12)), Some(12));
        assert_eq!(parse_code_id(&json!("7")), Some(7));
        assert_eq!(parse_code_id(&json!("seven")), None);
        assert_eq!(parse_code_id(&json!(null)), None);
        assert_eq!(parse_code_id(&json!(-1)), None);
    }

    #[test]
    fn test_upload_url() {
        let rb = ChainRequestBuilder::new("http://127.0.0.1:8080/", "localjuno-1").unwrap();
        assert_eq!(rb.upload_url(), "http://127.0.0.1:8080/upload");
        let rb = ChainRequestBuilder::new("http://127.0.0.1:8080", "localjuno-1").unwrap();
        assert_eq!(rb.upload_url(), "http://127.0.0.1:8080/upload");
    }
}

//! `server.json` loading.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use localic_types::{LocalicError, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Where the harness REST server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Deserialize)]
struct RawServerConfig {
    host: Option<String>,
    port: Option<Value>,
}

impl ServerConfig {
    pub fn api_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Parse `{"host", "port"}`, either top-level or under `"server"`.
    /// Missing fields fall back to the defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(text)?;
        if let Some(server) = value.get_mut("server") {
            value = server.take();
        }
        let raw: RawServerConfig = serde_json::from_value(value)?;

        let mut config = Self::default();
        if let Some(host) = raw.host.filter(|h| !h.is_empty()) {
            config.host = host;
        }
        if let Some(port) = raw.port {
            config.port = parse_port(&port)?;
        }
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            LocalicError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }
}

fn parse_port(port: &Value) -> Result<u16> {
    let parsed = match port {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| LocalicError::Config(format!("invalid port: {port}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_as_string_or_number() {
        let config = ServerConfig::from_json(r#"{"host": "0.0.0.0", "port": "8081"}"#).unwrap();
        assert_eq!(config, ServerConfig { host: "0.0.0.0".into(), port: 8081 });

        let config = ServerConfig::from_json(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.api_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_nested_server_section() {
        let config = ServerConfig::from_json(
            r#"{"chains": [], "server": {"host": "localhost", "port": "8080"}}"#,
        )
        .unwrap();
        assert_eq!(config.api_url(), "http://localhost:8080");
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            ServerConfig::from_json(r#"{"port": "http"}"#),
            Err(LocalicError::Config(_))
        ));
        assert!(ServerConfig::from_json(r#"{"port": 70000}"#).is_err());
        assert!(ServerConfig::from_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        assert!(matches!(ServerConfig::load(&path).await, Err(LocalicError::Config(_))));

        std::fs::write(&path, r#"{"host": "10.0.0.2", "port": 1234}"#).unwrap();
        assert_eq!(ServerConfig::load(&path).await.unwrap().port, 1234);
    }
}

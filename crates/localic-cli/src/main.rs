use std::path::PathBuf;

use clap::Parser;
use localic_tx::ChainRequestBuilder;
use localic_types::Result;

mod config;
mod scenario;
mod telemetry;

use config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "localic-api-test")]
#[command(version, about = "Smoke test a local-interchain REST server")]
struct Cli {
    /// REST server address
    #[arg(long, default_value = DEFAULT_HOST)]
    api_address: String,

    /// REST server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    api_port: u16,

    /// server.json to read host and port from (overrides the flags)
    #[arg(long, env = "LOCALIC_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// Chain to run the checks against
    #[arg(long, default_value = "localjuno-1")]
    chain_id: String,

    /// How long to wait for the server to come up
    #[arg(long, default_value_t = 120)]
    wait_seconds: u32,

    /// Log request payloads
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    async fn server(&self) -> Result<ServerConfig> {
        match &self.config {
            Some(path) => ServerConfig::load(path).await,
            None => Ok(ServerConfig {
                host: self.api_address.clone(),
                port: self.api_port,
            }),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(if cli.verbose { "debug" } else { "info" });

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let server = cli.server().await?;
    let api = server.api_url();
    tracing::info!(%api, chain_id = %cli.chain_id, "starting api test");

    let rb = ChainRequestBuilder::new(&api, &cli.chain_id)?.with_log_output(true);
    scenario::run(&rb, cli.wait_seconds).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let cli = Cli::try_parse_from(["localic-api-test"]).unwrap();
        assert_eq!(cli.api_address, "127.0.0.1");
        assert_eq!(cli.api_port, 8080);
        assert_eq!(cli.chain_id, "localjuno-1");
        assert_eq!(cli.wait_seconds, 120);
        assert!(!cli.verbose);
    }

    #[tokio::test]
    async fn test_config_file_overrides_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(&path, r#"{"server": {"host": "localhost", "port": "9090"}}"#).unwrap();

        let cli = Cli::try_parse_from([
            "localic-api-test",
            "--api-port",
            "1",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli.server().await.unwrap().api_url(), "http://localhost:9090");

        let cli = Cli::try_parse_from(["localic-api-test", "--api-address", "0.0.0.0", "--api-port", "8081"]).unwrap();
        assert_eq!(cli.server().await.unwrap().api_url(), "http://0.0.0.0:8081");
    }
}

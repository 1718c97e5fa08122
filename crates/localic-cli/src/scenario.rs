//! API smoke test against a running harness.

use serde_json::Value;
use localic_ops::{Bank, Coin};
use localic_tx::{poll_for_start, ChainRequestBuilder};
use localic_types::{LocalicError, Result};

/// Recipient used by the transfer check.
const RECIPIENT: &str = "juno10r39fueph9fq7a6lgswu4zdsg8t3gxlq670lt0";

const CONFIG_KEYS: [&str; 4] = ["chain-id", "keyring-backend", "output", "node"];

pub async fn run(rb: &ChainRequestBuilder, wait_seconds: u32) -> Result<()> {
    poll_for_start(rb.client(), rb.api(), wait_seconds).await?;

    bin_test(rb).await?;
    tx_test(rb).await?;

    tracing::info!(chain_id = rb.chain_id(), "api test passed");
    Ok(())
}

/// The base layer answers and returns decoded data.
async fn bin_test(rb: &ChainRequestBuilder) -> Result<()> {
    let keys = rb.binary("keys list --keyring-backend=test --output=json").await?;
    ensure(is_non_empty(&keys), || format!("no keys listed: {keys}"))?;

    rb.binary("config keyring-backend test").await?;
    let config = rb.binary("config").await?;
    check_client_config(&config)?;

    let supply = rb.query("bank total").await?;
    ensure(supply.get("supply").is_some(), || format!("no supply in bank total: {supply}"))?;

    rb.query(&format!("bank balances {RECIPIENT} --output=json")).await?;
    Ok(())
}

/// A transfer lands and the recipient's balance shows it.
async fn tx_test(rb: &ChainRequestBuilder) -> Result<()> {
    let res = rb
        .binary(&format!(
            "tx bank send acc0 {RECIPIENT} 500ujuno --fees 5000ujuno --node %RPC% --chain-id=%CHAIN_ID% --yes --output json --keyring-backend=test"
        ))
        .await?;
    let code = rb.get_sdk_status_code(&res)?;
    ensure(code == 0, || format!("bank send failed with code {code}: {res}"))?;

    let tx = rb.query_tx(&res).await?;
    tracing::debug!(%tx, "bank send tx");

    let balances = Bank::new(rb).balances(RECIPIENT).await?;
    ensure(!balances.is_empty(), || format!("{RECIPIENT} has no balances"))?;
    tracing::info!(
        balances = %balances.iter().map(Coin::to_string).collect::<Vec<_>>().join(","),
        "recipient balances"
    );
    Ok(())
}

/// `config` must carry the client settings as strings.
fn check_client_config(config: &Value) -> Result<()> {
    for key in CONFIG_KEYS {
        ensure(config[key].is_string(), || format!("config is missing string {key:?}: {config}"))?;
    }
    Ok(())
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty() && value.get("parse_error").is_none(),
        Value::Null => false,
        _ => true,
    }
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(LocalicError::Other(msg()))
    }
}

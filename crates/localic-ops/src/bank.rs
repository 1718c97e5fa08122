//! Bank module helpers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use localic_tx::ChainRequestBuilder;
use localic_types::{LocalicError, Result};

/// An amount of one denom. The amount stays a string, as the SDK prints it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl ToString, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Bank queries and transfers on one chain.
pub struct Bank<'a> {
    rb: &'a ChainRequestBuilder,
}

impl<'a> Bank<'a> {
    pub fn new(rb: &'a ChainRequestBuilder) -> Self {
        Self { rb }
    }

    pub async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        let res = self
            .rb
            .query(&format!("bank balances {address} --output=json"))
            .await?;
        coins_at(&res, "balances")
    }

    pub async fn total_supply(&self) -> Result<Vec<Coin>> {
        let res = self.rb.query("bank total --output=json").await?;
        coins_at(&res, "supply")
    }

    /// Send `amount` from a keyring key and wait for the tx to be included.
    pub async fn send(&self, from_key: &str, to: &str, amount: &[Coin], fees: &Coin) -> Result<Value> {
        if amount.is_empty() {
            return Err(LocalicError::Other("bank send needs at least one coin".into()));
        }
        let amount = amount
            .iter()
            .map(Coin::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let cmd = format!(
            "tx bank send {from_key} {to} {amount} --fees={fees} --node=%RPC% --chain-id=%CHAIN_ID% --home=%HOME% --keyring-backend=test --output=json --yes"
        );
        self.rb.transaction(&cmd, true).await
    }
}

fn coins_at(res: &Value, key: &str) -> Result<Vec<Coin>> {
    match res.get(key) {
        Some(coins) => Ok(serde_json::from_value(coins.clone())?),
        None => Err(LocalicError::Other(format!("no {key} in response: {res}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coin_display() {
        assert_eq!(Coin::new(500, "ujuno").to_string(), "500ujuno");
        assert_eq!(Coin::new("1", "ibc/ABC").to_string(), "1ibc/ABC");
    }

    #[test]
    fn test_coins_at() {
        let res = json!({
            "balances": [{"denom": "ujuno", "amount": "1000"}],
            "pagination": {"next_key": null, "total": "0"}
        });
        assert_eq!(coins_at(&res, "balances").unwrap(), vec![Coin::new(1000, "ujuno")]);
        assert!(coins_at(&res, "supply").is_err());
        assert!(coins_at(&json!({"supply": "bad"}), "supply").is_err());
    }
}

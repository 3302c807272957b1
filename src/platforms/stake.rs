//! Stake.com dice integration.
//!
//! Talks to the casino GraphQL endpoint. Every bet is a 50% dice roll, so
//! Over maps to `above` with target 50 and Under to `below` with target 50.
//!
//! Auth: `x-access-token` header with a session API key.
//! The key never leaves the process and is never logged.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{debug, info};

use super::BetProvider;
use crate::error::EngineError;
use crate::types::{BetResolution, Side};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "https://stake.com/_api/graphql";
const PLATFORM_NAME: &str = "stake";

/// Even-chance dice target.
const TARGET: f64 = 50.0;

const DICE_ROLL_QUERY: &str = r#"
mutation DiceRoll($amount: Float!, $target: Float!, $condition: CasinoGameDiceConditionEnum!, $currency: CurrencyEnum!) {
  diceRoll(amount: $amount, target: $target, condition: $condition, currency: $currency) {
    id
    payoutMultiplier
    state {
      ... on CasinoGameDice {
        result
        target
        condition
      }
    }
    user {
      balances {
        available { amount currency }
      }
    }
  }
}"#;

const BALANCES_QUERY: &str = r#"
query UserBalances {
  user {
    balances {
      available { amount currency }
    }
  }
}"#;

// ---------------------------------------------------------------------------
// API response types (Stake GraphQL JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DiceRollData {
    #[serde(rename = "diceRoll")]
    dice_roll: DiceRollBet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiceRollBet {
    #[serde(default)]
    id: Option<String>,
    payout_multiplier: Decimal,
    state: DiceState,
    #[serde(default)]
    user: Option<UserBalances>,
}

#[derive(Debug, Deserialize)]
struct DiceState {
    result: f64,
}

#[derive(Debug, Deserialize)]
struct BalancesData {
    user: UserBalances,
}

#[derive(Debug, Deserialize)]
struct UserBalances {
    #[serde(default)]
    balances: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
struct Balance {
    available: AvailableBalance,
}

#[derive(Debug, Deserialize)]
struct AvailableBalance {
    amount: Decimal,
    currency: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct StakeClient {
    http: Client,
    api_key: Secret<String>,
    base_url: String,
}

impl StakeClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, EngineError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("fairdice/0.1.0")
            .build()
            .map_err(|e| EngineError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: Secret::new(api_key),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn graphql<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, EngineError> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let resp = self
            .http
            .post(&self.base_url)
            .header("x-access-token", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Provider(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Provider(format!("HTTP {status}: {body}")));
        }

        let parsed: GraphQlResponse<T> = resp
            .json()
            .await
            .map_err(|e| EngineError::Provider(format!("bad response body: {e}")))?;

        if let Some(err) = parsed.errors.first() {
            return Err(EngineError::Provider(err.message.clone()));
        }
        parsed
            .data
            .ok_or_else(|| EngineError::Provider("response had no data".into()))
    }

    fn pick_balance(balances: &UserBalances, currency: &str) -> Option<Decimal> {
        balances
            .balances
            .iter()
            .find(|b| b.available.currency.eq_ignore_ascii_case(currency))
            .map(|b| b.available.amount)
    }
}

#[async_trait]
impl BetProvider for StakeClient {
    fn name(&self) -> &str {
        PLATFORM_NAME
    }

    async fn place_bet(
        &self,
        side: Side,
        amount: Decimal,
        currency: &str,
    ) -> Result<BetResolution, EngineError> {
        let condition = match side {
            Side::Over => "above",
            Side::Under => "below",
        };
        let variables = serde_json::json!({
            "amount": amount,
            "target": TARGET,
            "condition": condition,
            "currency": currency,
        });

        let data: DiceRollData = self.graphql(DICE_ROLL_QUERY, variables).await?;
        let bet = data.dice_roll;

        let result = Side::from_roll(bet.state.result);
        let new_balance = bet
            .user
            .as_ref()
            .and_then(|u| Self::pick_balance(u, currency));

        info!(
            bet_id = bet.id.as_deref().unwrap_or("-"),
            roll = bet.state.result,
            %result,
            %amount,
            "Stake bet settled"
        );

        Ok(BetResolution {
            roll: bet.state.result,
            result,
            payout_multiplier: bet.payout_multiplier,
            new_balance,
        })
    }

    async fn get_balance(&self, currency: &str) -> Result<Decimal, EngineError> {
        let data: BalancesData = self
            .graphql(BALANCES_QUERY, serde_json::Value::Null)
            .await?;
        let amount = Self::pick_balance(&data.user, currency).ok_or_else(|| {
            EngineError::Provider(format!("no balance for currency {currency}"))
        })?;
        debug!(%amount, currency, "Balance fetched");
        Ok(amount)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_client_uses_default_url() {
        let client = StakeClient::new("key".into(), None).unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.name(), "stake");
    }

    #[test]
    fn test_dice_roll_response_parses() {
        let json = r#"{
            "data": {
                "diceRoll": {
                    "id": "abc",
                    "payoutMultiplier": 1.98,
                    "state": { "result": 42.17, "target": 50.0, "condition": "below" },
                    "user": {
                        "balances": [
                            { "available": { "amount": 12.345678, "currency": "usd" } }
                        ]
                    }
                }
            }
        }"#;
        let parsed: GraphQlResponse<DiceRollData> = serde_json::from_str(json).unwrap();
        let bet = parsed.data.unwrap().dice_roll;
        assert_eq!(bet.payout_multiplier, dec!(1.98));
        assert_eq!(bet.state.result, 42.17);
        let balance = StakeClient::pick_balance(bet.user.as_ref().unwrap(), "USD");
        assert_eq!(balance, Some(dec!(12.345678)));
    }

    #[test]
    fn test_graphql_error_surfaces() {
        let json = r#"{ "data": null, "errors": [ { "message": "insufficient funds" } ] }"#;
        let parsed: GraphQlResponse<DiceRollData> = serde_json::from_str(json).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors[0].message, "insufficient funds");
    }

    #[test]
    fn test_balances_response_parses() {
        let json = r#"{
            "data": {
                "user": {
                    "balances": [
                        { "available": { "amount": 1.5, "currency": "btc" } },
                        { "available": { "amount": 250.0, "currency": "usd" } }
                    ]
                }
            }
        }"#;
        let parsed: GraphQlResponse<BalancesData> = serde_json::from_str(json).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(StakeClient::pick_balance(&data.user, "usd"), Some(dec!(250.0)));
        assert_eq!(StakeClient::pick_balance(&data.user, "eth"), None);
    }
}

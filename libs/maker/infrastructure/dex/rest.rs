//! REST implementations of the exchange interfaces.
//!
//! `RestDexClient` talks to the exchange's public market API.
//! `RestTradingAccount` talks to the account service that owns the keys
//! and performs the actual chain transactions on the bot's behalf.

use super::{DexApi, DexError, DexMarket, DexTicker, Result, TradingAccount, TxId};
use crate::domain::ladder::Side;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMarket {
    id: String,
    base_token_address: String,
    quote_token_address: String,
}

// The exchange reports prices as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTicker {
    best_bid: String,
    best_ask: String,
}

#[derive(Debug, Deserialize)]
struct WireBalance {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct WireAllowance {
    allowance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAck {
    tx_id: String,
}

fn parse_amount(value: &str, field: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| DexError::Decode(format!("{field} is not a number: '{value}'")))
}

async fn expect_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(DexError::Api(format!("{context} returned {status}: {body}")))
}

/// Exchange market-data client.
pub struct RestDexClient {
    base_url: String,
    client: Client,
}

impl RestDexClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl DexApi for RestDexClient {
    async fn get_market(&self, dex_symbol: &str) -> Result<DexMarket> {
        let url = format!("{}/markets/{}", self.base_url, dex_symbol);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DexError::MarketNotFound(dex_symbol.to_string()));
        }
        let response = expect_success(response, "market lookup").await?;

        let market: WireMarket = response.json().await?;
        Ok(DexMarket {
            id: market.id,
            base_token_address: market.base_token_address,
            quote_token_address: market.quote_token_address,
        })
    }

    async fn get_ticker(&self, dex_symbol: &str) -> Result<DexTicker> {
        let url = format!("{}/markets/{}/ticker", self.base_url, dex_symbol);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DexError::MarketNotFound(dex_symbol.to_string()));
        }
        let response = expect_success(response, "ticker fetch").await?;

        let ticker: WireTicker = response.json().await?;
        Ok(DexTicker {
            bid: parse_amount(&ticker.best_bid, "bestBid")?,
            ask: parse_amount(&ticker.best_ask, "bestAsk")?,
        })
    }
}

/// Account-service client. Each mutating call blocks until the service
/// acknowledges the transaction and returns its identifier.
pub struct RestTradingAccount {
    base_url: String,
    client: Client,
}

impl RestTradingAccount {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TradingAccount for RestTradingAccount {
    async fn get_native_balance(&self) -> Result<f64> {
        let url = format!("{}/balance", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = expect_success(response, "native balance").await?;
        let balance: WireBalance = response.json().await?;
        parse_amount(&balance.balance, "balance")
    }

    async fn get_token_balance(&self, token_address: &str) -> Result<f64> {
        let url = format!("{}/balance/{}", self.base_url, token_address);
        let response = self.client.get(&url).send().await?;
        let response = expect_success(response, "token balance").await?;
        let balance: WireBalance = response.json().await?;
        parse_amount(&balance.balance, "balance")
    }

    async fn get_allowance(&self, token_address: &str) -> Result<f64> {
        let url = format!("{}/allowance/{}", self.base_url, token_address);
        let response = self.client.get(&url).send().await?;
        let response = expect_success(response, "allowance").await?;
        let allowance: WireAllowance = response.json().await?;
        parse_amount(&allowance.allowance, "allowance")
    }

    async fn set_unlimited_allowance(&self, token_address: &str) -> Result<TxId> {
        let url = format!("{}/allowance/{}", self.base_url, token_address);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "unlimited": true }))
            .send()
            .await?;
        let response = expect_success(response, "allowance grant").await?;
        let ack: WireAck = response.json().await?;
        Ok(ack.tx_id)
    }

    async fn wrap_native(&self, amount: f64) -> Result<TxId> {
        let url = format!("{}/wrap", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "amount": amount.to_string() }))
            .send()
            .await?;
        let response = expect_success(response, "wrap").await?;
        let ack: WireAck = response.json().await?;
        Ok(ack.tx_id)
    }

    async fn submit_limit_order(
        &self,
        market_id: &str,
        side: Side,
        quantity: f64,
        price: f64,
        expires_at: i64,
    ) -> Result<TxId> {
        let url = format!("{}/orders", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "market": market_id,
                "side": side,
                "quantity": quantity.to_string(),
                "price": price.to_string(),
                "expiresAt": expires_at,
            }))
            .send()
            .await?;
        let response = expect_success(response, "order submission").await?;
        let ack: WireAck = response.json().await?;
        Ok(ack.tx_id)
    }
}

//! Narrow interfaces to the exchange the orders are placed on.
//!
//! The core never talks to the chain directly: balances, allowances,
//! wrapping, and order submission go through `TradingAccount`, and market
//! metadata/tickers through `DexApi`. Both are trait seams so the seeding
//! logic can be exercised against doubles.

mod rest;

pub use rest::{RestDexClient, RestTradingAccount};

use crate::domain::ladder::Side;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("DEX API error: {0}")]
    Api(String),

    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, DexError>;

/// Identifier of an acknowledged on-chain transaction or accepted order.
pub type TxId = String;

/// Exchange-side market metadata needed for balance and allowance checks.
#[derive(Debug, Clone)]
pub struct DexMarket {
    pub id: String,
    pub base_token_address: String,
    pub quote_token_address: String,
}

/// Best bid/ask on the exchange's own book.
#[derive(Debug, Clone, Copy)]
pub struct DexTicker {
    pub bid: f64,
    pub ask: f64,
}

/// Market metadata and ticker access on the exchange.
#[async_trait]
pub trait DexApi: Send + Sync {
    async fn get_market(&self, dex_symbol: &str) -> Result<DexMarket>;

    async fn get_ticker(&self, dex_symbol: &str) -> Result<DexTicker>;
}

/// Account operations the seeding flow depends on. Every call is
/// asynchronous, may fail, and is acknowledged before the caller proceeds.
#[async_trait]
pub trait TradingAccount: Send + Sync {
    /// Balance of the chain's native asset.
    async fn get_native_balance(&self) -> Result<f64>;

    /// Balance of an ERC-style token.
    async fn get_token_balance(&self, token_address: &str) -> Result<f64>;

    /// Current spend allowance granted to the exchange for a token.
    async fn get_allowance(&self, token_address: &str) -> Result<f64>;

    /// Grant an effectively unlimited spend allowance for a token.
    async fn set_unlimited_allowance(&self, token_address: &str) -> Result<TxId>;

    /// Convert native asset into its wrapped, tradable form.
    async fn wrap_native(&self, amount: f64) -> Result<TxId>;

    /// Place one limit order on the exchange.
    async fn submit_limit_order(
        &self,
        market_id: &str,
        side: Side,
        quantity: f64,
        price: f64,
        expires_at: i64,
    ) -> Result<TxId>;
}

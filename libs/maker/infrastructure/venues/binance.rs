//! Binance public REST client.

use super::{parse_decimal, PairDescriptor, Result, VenueClient, VenueError, VenueTicker};
use crate::domain::pair::TradingPair;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const VENUE_ID: &str = "binance";

const BASE_URL: &str = "https://api.binance.com";
const CATALOGUE_TIMEOUT: Duration = Duration::from_secs(30);
const TICKER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    base_asset: String,
    quote_asset: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    bid_price: String,
    bid_qty: String,
    ask_price: String,
    ask_qty: String,
}

pub struct BinanceClient {
    base_url: String,
    client: Client,
}

impl BinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    // Binance spells a pair as the concatenated asset symbols.
    fn symbol(pair: &TradingPair) -> String {
        format!("{}{}", pair.base, pair.quote)
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueClient for BinanceClient {
    fn id(&self) -> &str {
        VENUE_ID
    }

    async fn fetch_markets(&self) -> Result<Vec<PairDescriptor>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(CATALOGUE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VenueError::Api(format!(
                "exchangeInfo returned {}",
                response.status()
            )));
        }

        let info: ExchangeInfo = response.json().await?;
        let markets: Vec<PairDescriptor> = info
            .symbols
            .into_iter()
            .filter(|symbol| symbol.status == "TRADING")
            .map(|symbol| PairDescriptor {
                base: symbol.base_asset,
                quote: symbol.quote_asset,
            })
            .collect();

        debug!(count = markets.len(), "binance catalogue fetched");
        Ok(markets)
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<VenueTicker> {
        let url = format!(
            "{}/api/v3/ticker/bookTicker?symbol={}",
            self.base_url,
            Self::symbol(pair)
        );
        let response = self.client.get(&url).timeout(TICKER_TIMEOUT).send().await?;

        if !response.status().is_success() {
            return Err(VenueError::Api(format!(
                "bookTicker for {pair} returned {}",
                response.status()
            )));
        }

        let ticker: BookTicker = response.json().await?;
        Ok(VenueTicker {
            bid: parse_decimal(&ticker.bid_price, "bidPrice")?,
            ask: parse_decimal(&ticker.ask_price, "askPrice")?,
            bid_volume: parse_decimal(&ticker.bid_qty, "bidQty").ok(),
            ask_volume: parse_decimal(&ticker.ask_qty, "askQty").ok(),
        })
    }
}

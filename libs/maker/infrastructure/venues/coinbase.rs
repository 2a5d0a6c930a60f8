//! Coinbase Exchange public REST client.

use super::{parse_decimal, PairDescriptor, Result, VenueClient, VenueError, VenueTicker};
use crate::domain::pair::TradingPair;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const VENUE_ID: &str = "coinbase";

const BASE_URL: &str = "https://api.exchange.coinbase.com";
const CATALOGUE_TIMEOUT: Duration = Duration::from_secs(30);
const TICKER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Product {
    base_currency: String,
    quote_currency: String,
    status: String,
}

// Coinbase's ticker carries no per-side depth.
#[derive(Debug, Deserialize)]
struct ProductTicker {
    bid: String,
    ask: String,
}

pub struct CoinbaseClient {
    base_url: String,
    client: Client,
}

impl CoinbaseClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    fn product_id(pair: &TradingPair) -> String {
        format!("{}-{}", pair.base, pair.quote)
    }
}

impl Default for CoinbaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueClient for CoinbaseClient {
    fn id(&self) -> &str {
        VENUE_ID
    }

    async fn fetch_markets(&self) -> Result<Vec<PairDescriptor>> {
        let url = format!("{}/products", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(CATALOGUE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VenueError::Api(format!(
                "products returned {}",
                response.status()
            )));
        }

        let products: Vec<Product> = response.json().await?;
        let markets: Vec<PairDescriptor> = products
            .into_iter()
            .filter(|product| product.status == "online")
            .map(|product| PairDescriptor {
                base: product.base_currency,
                quote: product.quote_currency,
            })
            .collect();

        debug!(count = markets.len(), "coinbase catalogue fetched");
        Ok(markets)
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<VenueTicker> {
        let url = format!(
            "{}/products/{}/ticker",
            self.base_url,
            Self::product_id(pair)
        );
        let response = self.client.get(&url).timeout(TICKER_TIMEOUT).send().await?;

        if !response.status().is_success() {
            return Err(VenueError::Api(format!(
                "ticker for {pair} returned {}",
                response.status()
            )));
        }

        let ticker: ProductTicker = response.json().await?;
        Ok(VenueTicker {
            bid: parse_decimal(&ticker.bid, "bid")?,
            ask: parse_decimal(&ticker.ask, "ask")?,
            bid_volume: None,
            ask_volume: None,
        })
    }
}

//! Kraken public REST client.

use super::{parse_decimal, PairDescriptor, Result, VenueClient, VenueError, VenueTicker};
use crate::domain::pair::TradingPair;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const VENUE_ID: &str = "kraken";

const BASE_URL: &str = "https://api.kraken.com";
const CATALOGUE_TIMEOUT: Duration = Duration::from_secs(30);
const TICKER_TIMEOUT: Duration = Duration::from_secs(10);

/// Kraken wraps every payload in `{error: [...], result: ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self, what: &str) -> Result<T> {
        if !self.error.is_empty() {
            return Err(VenueError::Api(self.error.join(", ")));
        }
        self.result
            .ok_or_else(|| VenueError::Decode(format!("{what} response has no result")))
    }
}

#[derive(Debug, Deserialize)]
struct AssetPair {
    // Friendly "BASE/QUOTE" spelling; absent for dark-pool entries.
    wsname: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Ask: [price, whole lot volume, lot volume]
    a: Vec<String>,
    /// Bid: [price, whole lot volume, lot volume]
    b: Vec<String>,
}

pub struct KrakenClient {
    base_url: String,
    client: Client,
}

impl KrakenClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

impl Default for KrakenClient {
    fn default() -> Self {
        Self::new()
    }
}

fn price_at(levels: &[String], index: usize, field: &str) -> Result<Option<f64>> {
    match levels.get(index) {
        Some(value) => parse_decimal(value, field).map(Some),
        None => Ok(None),
    }
}

#[async_trait]
impl VenueClient for KrakenClient {
    fn id(&self) -> &str {
        VENUE_ID
    }

    async fn fetch_markets(&self) -> Result<Vec<PairDescriptor>> {
        let url = format!("{}/0/public/AssetPairs", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(CATALOGUE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VenueError::Api(format!(
                "AssetPairs returned {}",
                response.status()
            )));
        }

        let envelope: Envelope<HashMap<String, AssetPair>> = response.json().await?;
        let pairs = envelope.into_result("AssetPairs")?;

        let markets: Vec<PairDescriptor> = pairs
            .values()
            .filter(|pair| pair.status.as_deref().unwrap_or("online") == "online")
            .filter_map(|pair| pair.wsname.as_deref())
            .filter_map(|wsname| wsname.split_once('/'))
            .map(|(base, quote)| PairDescriptor {
                base: base.to_string(),
                quote: quote.to_string(),
            })
            .collect();

        debug!(count = markets.len(), "kraken catalogue fetched");
        Ok(markets)
    }

    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<VenueTicker> {
        // The altname is the wsname without its separator.
        let url = format!(
            "{}/0/public/Ticker?pair={}{}",
            self.base_url, pair.base, pair.quote
        );
        let response = self.client.get(&url).timeout(TICKER_TIMEOUT).send().await?;

        if !response.status().is_success() {
            return Err(VenueError::Api(format!(
                "Ticker for {pair} returned {}",
                response.status()
            )));
        }

        let envelope: Envelope<HashMap<String, TickerInfo>> = response.json().await?;
        let result = envelope.into_result("Ticker")?;
        let ticker = result
            .into_values()
            .next()
            .ok_or_else(|| VenueError::Decode(format!("no ticker entry for {pair}")))?;

        let bid = price_at(&ticker.b, 0, "bid price")?
            .ok_or_else(|| VenueError::Decode(format!("empty bid array for {pair}")))?;
        let ask = price_at(&ticker.a, 0, "ask price")?
            .ok_or_else(|| VenueError::Decode(format!("empty ask array for {pair}")))?;

        Ok(VenueTicker {
            bid,
            ask,
            bid_volume: price_at(&ticker.b, 2, "bid volume")?,
            ask_volume: price_at(&ticker.a, 2, "ask volume")?,
        })
    }
}

//! External-venue capability interface and registry.
//!
//! Every price venue exposes the same two capabilities: a tradable-pair
//! catalogue and a live best bid/ask. Venues are constructed from the
//! configured name list through an explicit match — there is no runtime
//! string dispatch into a client namespace.

pub mod binance;
pub mod coinbase;
pub mod kraken;

use crate::domain::pair::TradingPair;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VenueError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("venue API error: {0}")]
    Api(String),

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("ticker fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("unknown venue '{0}'")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, VenueError>;

/// One tradable pair as reported by a venue's catalogue.
#[derive(Debug, Clone)]
pub struct PairDescriptor {
    pub base: String,
    pub quote: String,
}

/// Best bid/ask reported by one venue. Depth is optional; venues that do
/// not report it contribute a unit size during aggregation.
#[derive(Debug, Clone, Copy)]
pub struct VenueTicker {
    pub bid: f64,
    pub ask: f64,
    pub bid_volume: Option<f64>,
    pub ask_volume: Option<f64>,
}

#[async_trait]
pub trait VenueClient: Send + Sync {
    /// Stable identifier used in configuration and the venue index.
    fn id(&self) -> &str;

    /// The venue's full tradable-pair catalogue.
    async fn fetch_markets(&self) -> Result<Vec<PairDescriptor>>;

    /// Live best bid/ask for a feed-format pair.
    async fn fetch_ticker(&self, pair: &TradingPair) -> Result<VenueTicker>;
}

/// The set of configured venues, in configuration order.
pub struct VenueRegistry {
    venues: Vec<Box<dyn VenueClient>>,
}

impl std::fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueRegistry")
            .field("venues", &self.venues.len())
            .finish()
    }
}

impl VenueRegistry {
    /// Build the registry from configured venue names.
    pub fn from_names(names: &[String]) -> Result<Self> {
        let mut venues: Vec<Box<dyn VenueClient>> = Vec::with_capacity(names.len());
        for name in names {
            let client: Box<dyn VenueClient> = match name.as_str() {
                binance::VENUE_ID => Box::new(binance::BinanceClient::new()),
                kraken::VENUE_ID => Box::new(kraken::KrakenClient::new()),
                coinbase::VENUE_ID => Box::new(coinbase::CoinbaseClient::new()),
                other => return Err(VenueError::Unknown(other.to_string())),
            };
            venues.push(client);
        }
        Ok(Self { venues })
    }

    /// Build a registry from pre-constructed clients.
    pub fn from_clients(venues: Vec<Box<dyn VenueClient>>) -> Self {
        Self { venues }
    }

    pub fn get(&self, id: &str) -> Option<&dyn VenueClient> {
        self.venues
            .iter()
            .find(|venue| venue.id() == id)
            .map(|venue| venue.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn VenueClient> {
        self.venues.iter().map(|venue| venue.as_ref())
    }

    /// Total configured venues — the confidence denominator.
    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

/// Parse a numeric field venues report as a JSON string.
pub(crate) fn parse_decimal(value: &str, field: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| VenueError::Decode(format!("{field} is not a number: '{value}'")))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable venue stub shared by cache and aggregator tests.

    use super::*;

    pub struct StubVenue {
        pub id: &'static str,
        pub markets: Vec<PairDescriptor>,
        pub ticker: Option<VenueTicker>,
        pub fail_markets: bool,
    }

    impl StubVenue {
        pub fn listing(id: &'static str, pairs: &[(&str, &str)]) -> Self {
            Self {
                id,
                markets: pairs
                    .iter()
                    .map(|(base, quote)| PairDescriptor {
                        base: base.to_string(),
                        quote: quote.to_string(),
                    })
                    .collect(),
                ticker: None,
                fail_markets: false,
            }
        }

        pub fn with_ticker(mut self, bid: f64, ask: f64) -> Self {
            self.ticker = Some(VenueTicker {
                bid,
                ask,
                bid_volume: None,
                ask_volume: None,
            });
            self
        }

        pub fn broken_catalogue(id: &'static str) -> Self {
            Self {
                id,
                markets: Vec::new(),
                ticker: None,
                fail_markets: true,
            }
        }
    }

    #[async_trait]
    impl VenueClient for StubVenue {
        fn id(&self) -> &str {
            self.id
        }

        async fn fetch_markets(&self) -> Result<Vec<PairDescriptor>> {
            if self.fail_markets {
                return Err(VenueError::Api("catalogue unavailable".to_string()));
            }
            Ok(self.markets.clone())
        }

        async fn fetch_ticker(&self, pair: &TradingPair) -> Result<VenueTicker> {
            self.ticker
                .ok_or_else(|| VenueError::Api(format!("no ticker for {pair}")))
        }
    }

    #[test]
    fn registry_rejects_unknown_venue() {
        let err = VenueRegistry::from_names(&["binance".into(), "mtgox".into()]).unwrap_err();
        assert!(matches!(err, VenueError::Unknown(name) if name == "mtgox"));
    }

    #[test]
    fn registry_preserves_configuration_order() {
        let registry = VenueRegistry::from_names(&[
            "kraken".into(),
            "binance".into(),
            "coinbase".into(),
        ])
        .unwrap();
        let ids: Vec<&str> = registry.iter().map(|v| v.id()).collect();
        assert_eq!(ids, ["kraken", "binance", "coinbase"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("binance").is_some());
        assert!(registry.get("mtgox").is_none());
    }
}

//! Cross-venue ticker aggregation.

use crate::domain::pair::{PairFormat, TradingPair};
use crate::domain::quote::Quote;
use crate::infrastructure::venue_index::{IndexError, VenueIndexCache};
use crate::infrastructure::venues::{VenueError, VenueRegistry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("no venues found for pair {pair}")]
    NoVenuesFound { pair: String },

    #[error("venue index error: {0}")]
    Index(#[from] IndexError),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

/// Percentage of configured venues represented by `successes`.
///
/// The denominator is deliberately every configured venue, not just the
/// venues known to list the pair, so confidence drops both when venues
/// fail and when a pair is thinly listed.
pub fn confidence(successes: usize, total_configured: usize) -> f64 {
    if total_configured == 0 {
        return 0.0;
    }
    successes as f64 / total_configured as f64 * 100.0
}

/// Averages live tickers across every venue known to list a pair.
pub struct TickerAggregator {
    registry: Arc<VenueRegistry>,
    index: Arc<RwLock<VenueIndexCache>>,
    format: PairFormat,
    fetch_timeout: Duration,
}

impl TickerAggregator {
    pub fn new(
        registry: Arc<VenueRegistry>,
        index: Arc<RwLock<VenueIndexCache>>,
        format: PairFormat,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            index,
            format,
            fetch_timeout,
        }
    }

    /// Aggregate one reference quote for `pair`.
    ///
    /// Each listed venue is queried concurrently under a bounded timeout.
    /// A venue that fails or times out is excluded from the average and
    /// from the success count; it never poisons the accumulator. When no
    /// venue responds the result is `Quote::unavailable()`, not an error.
    pub async fn get_reference_quote(&self, pair: &TradingPair) -> Result<Quote> {
        let feed_pair = self.format.to_feed_pair(pair);
        let key = feed_pair.to_string();

        let venue_ids = self.resolve_venues(&key).await?;
        debug!(pair = %key, venues = venue_ids.len(), "aggregating tickers");

        let fetch_timeout = self.fetch_timeout;
        let fetches = venue_ids
            .iter()
            .filter_map(|id| {
                let Some(venue) = self.registry.get(id) else {
                    debug!(venue = %id, "indexed venue is not configured, skipping");
                    return None;
                };
                let feed_pair = feed_pair.clone();
                Some(async move {
                    let outcome = match timeout(fetch_timeout, venue.fetch_ticker(&feed_pair)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(VenueError::Timeout(fetch_timeout)),
                    };
                    (venue.id().to_string(), outcome)
                })
            })
            .collect::<Vec<_>>();

        let results = join_all(fetches).await;

        let mut bid_sum = 0.0;
        let mut ask_sum = 0.0;
        let mut bid_size = 0.0;
        let mut ask_size = 0.0;
        let mut successes = 0usize;

        for (venue, outcome) in results {
            match outcome {
                Ok(ticker) => {
                    bid_sum += ticker.bid;
                    ask_sum += ticker.ask;
                    // A venue reporting no depth still counts one unit.
                    bid_size += ticker.bid_volume.unwrap_or(1.0);
                    ask_size += ticker.ask_volume.unwrap_or(1.0);
                    successes += 1;
                    debug!(venue = %venue, bid = ticker.bid, ask = ticker.ask, "venue ticker");
                }
                Err(e) => {
                    warn!(venue = %venue, pair = %key, "ticker fetch failed, excluding venue: {e}");
                }
            }
        }

        if successes == 0 {
            return Ok(Quote::unavailable());
        }

        Ok(Quote {
            bid: Some(bid_sum / successes as f64),
            ask: Some(ask_sum / successes as f64),
            bid_size,
            ask_size,
            confidence: confidence(successes, self.registry.len()),
        })
    }

    /// Venue set for a pair, rebuilding the index once when it has no
    /// entry. Still no entry after the rebuild means the pair is unknown.
    async fn resolve_venues(&self, key: &str) -> Result<Vec<String>> {
        {
            let index = self.index.read().await;
            if let Some(venues) = index.lookup(key) {
                if !venues.is_empty() {
                    return Ok(venues.to_vec());
                }
            }
        }

        let mut index = self.index.write().await;
        // Another caller may have rebuilt while we waited for the lock.
        if index.lookup(key).is_none() {
            info!(pair = %key, "pair not in venue index, rebuilding");
            index.rebuild(&self.registry, &self.format).await?;
        }

        index
            .lookup(key)
            .filter(|venues| !venues.is_empty())
            .map(|venues| venues.to_vec())
            .ok_or_else(|| AggregatorError::NoVenuesFound {
                pair: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::venues::testing::StubVenue;
    use crate::infrastructure::venues::VenueClient;
    use tempfile::tempdir;

    fn aggregator(venues: Vec<StubVenue>) -> (TickerAggregator, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let registry = Arc::new(VenueRegistry::from_clients(
            venues
                .into_iter()
                .map(|v| Box::new(v) as Box<dyn VenueClient>)
                .collect(),
        ));
        let index = Arc::new(RwLock::new(
            VenueIndexCache::load(dir.path().join("index.json")).unwrap(),
        ));
        let aggregator = TickerAggregator::new(
            registry,
            index,
            PairFormat::default(),
            Duration::from_secs(5),
        );
        (aggregator, dir)
    }

    fn pair() -> TradingPair {
        TradingPair::parse("ZRX/ETH").unwrap()
    }

    #[tokio::test]
    async fn averages_across_successful_venues() {
        // 3 configured venues, 2 respond: (10, 11) and (12, 13).
        let (aggregator, _dir) = aggregator(vec![
            StubVenue::listing("binance", &[("ZRX", "ETH")]).with_ticker(10.0, 11.0),
            StubVenue::listing("kraken", &[("ZRX", "ETH")]).with_ticker(12.0, 13.0),
            StubVenue::listing("coinbase", &[("ZRX", "ETH")]),
        ]);

        let quote = aggregator.get_reference_quote(&pair()).await.unwrap();

        assert_eq!(quote.bid, Some(11.0));
        assert_eq!(quote.ask, Some(12.0));
        assert!((quote.confidence - 66.67).abs() < 0.01);
        // Both successful venues reported no depth, so one unit each.
        assert_eq!(quote.bid_size, 2.0);
        assert_eq!(quote.ask_size, 2.0);
    }

    #[tokio::test]
    async fn sole_failing_venue_yields_unavailable_quote() {
        let (aggregator, _dir) =
            aggregator(vec![StubVenue::listing("binance", &[("ZRX", "ETH")])]);

        let quote = aggregator.get_reference_quote(&pair()).await.unwrap();

        assert_eq!(quote, Quote::unavailable());
        assert_eq!(quote.confidence, 0.0);
    }

    #[tokio::test]
    async fn unknown_pair_is_no_venues_found() {
        let (aggregator, _dir) =
            aggregator(vec![StubVenue::listing("binance", &[("MKR", "ETH")])]);

        let err = aggregator.get_reference_quote(&pair()).await.unwrap_err();
        assert!(matches!(err, AggregatorError::NoVenuesFound { pair } if pair == "ZRX/ETH"));
    }

    #[tokio::test]
    async fn wrapped_quote_resolves_to_feed_pair() {
        let (aggregator, _dir) = aggregator(vec![
            StubVenue::listing("binance", &[("ZRX", "ETH")]).with_ticker(10.0, 11.0)
        ]);

        let wrapped = TradingPair::parse("ZRX/WETH").unwrap();
        let quote = aggregator.get_reference_quote(&wrapped).await.unwrap();
        assert_eq!(quote.bid, Some(10.0));
        assert_eq!(quote.confidence, 100.0);
    }

    #[test]
    fn confidence_is_share_of_configured_venues() {
        assert_eq!(confidence(0, 3), 0.0);
        assert_eq!(confidence(3, 3), 100.0);
        assert!((confidence(2, 3) - 66.666).abs() < 0.01);
        assert_eq!(confidence(0, 0), 0.0);
    }
}

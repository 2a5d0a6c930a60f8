//! Aggregated reference quotes.

use serde::Serialize;

/// Cross-venue reference quote produced by the ticker aggregator.
///
/// `bid`/`ask` are `None` when no venue contributed a price; callers must
/// treat a missing side as "no tradeable reference" rather than a zero.
/// `confidence` is the percentage of configured venues that contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub bid_size: f64,
    pub ask_size: f64,
    pub confidence: f64,
}

impl Quote {
    /// The quote produced when every venue fetch failed.
    pub fn unavailable() -> Self {
        Self {
            bid: None,
            ask: None,
            bid_size: 0.0,
            ask_size: 0.0,
            confidence: 0.0,
        }
    }
}

/// The price source the caller selected for ladder planning: the aggregate
/// quote, the exchange's own ticker, or manually entered prices.
#[derive(Debug, Clone)]
pub struct ReferenceQuote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub confidence: Option<f64>,
}

impl ReferenceQuote {
    pub fn from_aggregate(quote: &Quote) -> Self {
        Self {
            bid: quote.bid,
            ask: quote.ask,
            confidence: Some(quote.confidence),
        }
    }

    pub fn manual(bid: f64, ask: f64) -> Self {
        Self {
            bid: Some(bid),
            ask: Some(ask),
            confidence: None,
        }
    }

    /// Bid usable for planning, if any.
    pub fn usable_bid(&self) -> Option<f64> {
        self.bid.filter(|b| b.is_finite() && *b > 0.0)
    }

    /// Ask usable for planning, if any.
    pub fn usable_ask(&self) -> Option<f64> {
        self.ask.filter(|a| a.is_finite() && *a > 0.0)
    }
}

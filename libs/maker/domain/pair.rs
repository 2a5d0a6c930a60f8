//! Trading pair identity and symbol conversion.
//!
//! The aggregated price feeds and the exchange the orders land on disagree
//! about how a market is spelled: the feeds quote against the native asset
//! with a slash separator (`ZRX/ETH`), the exchange quotes against the
//! wrapped form with a dash (`ZRX-WETH`). `PairFormat` owns both rewrites.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PairError {
    #[error("invalid pair '{0}': expected BASE/QUOTE or BASE-QUOTE")]
    Invalid(String),

    #[error("invalid pair '{0}': base and quote must differ")]
    SameAsset(String),
}

/// Canonical base/quote market identifier. Symbols are held upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, PairError> {
        let base = base.into().trim().to_uppercase();
        let quote = quote.into().trim().to_uppercase();
        if base.is_empty() || quote.is_empty() {
            return Err(PairError::Invalid(format!("{}/{}", base, quote)));
        }
        if base == quote {
            return Err(PairError::SameAsset(format!("{}/{}", base, quote)));
        }
        Ok(Self { base, quote })
    }

    /// Parse `BASE/QUOTE` or `BASE-QUOTE`, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, PairError> {
        let (base, quote) = s
            .split_once('/')
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| PairError::Invalid(s.to_string()))?;
        Self::new(base, quote)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Native/wrapped quote-asset symbols used by the two conversions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairFormat {
    #[serde(default = "default_native")]
    pub native: String,

    #[serde(default = "default_wrapped")]
    pub wrapped: String,
}

fn default_native() -> String {
    "ETH".to_string()
}

fn default_wrapped() -> String {
    "WETH".to_string()
}

impl Default for PairFormat {
    fn default() -> Self {
        Self {
            native: default_native(),
            wrapped: default_wrapped(),
        }
    }
}

impl PairFormat {
    /// Exchange-side market id: wrapped quote, dash separator.
    ///
    /// A pair already quoted in the wrapped form is left unchanged; any
    /// quote other than the native asset is passed through as-is.
    pub fn to_dex_symbol(&self, pair: &TradingPair) -> String {
        let quote = if pair.quote == self.native {
            &self.wrapped
        } else {
            &pair.quote
        };
        format!("{}-{}", pair.base, quote)
    }

    /// Feed-side symbol: native quote, slash separator.
    pub fn to_feed_symbol(&self, pair: &TradingPair) -> String {
        self.to_feed_pair(pair).to_string()
    }

    /// The pair as the external price feeds know it (wrapped quote
    /// rewritten to its native form).
    pub fn to_feed_pair(&self, pair: &TradingPair) -> TradingPair {
        let quote = if pair.quote == self.wrapped {
            self.native.clone()
        } else {
            pair.quote.clone()
        };
        TradingPair {
            base: pair.base.clone(),
            quote,
        }
    }

    /// True when the pair settles against the wrapped native asset on the
    /// exchange (either spelling of the quote).
    pub fn is_wrapped_quote(&self, pair: &TradingPair) -> bool {
        pair.quote == self.wrapped || pair.quote == self.native
    }
}

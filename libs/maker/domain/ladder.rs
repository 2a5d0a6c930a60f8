//! Order ladder primitives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side from the account's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One limit order of a spread ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderEntry {
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub expires_at: i64,
}

/// Round to the fixed 8-fractional-digit precision used for order prices
/// and on-chain amounts.
pub fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

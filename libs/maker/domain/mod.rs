//! Core domain types: pairs, quotes, and order ladders.

pub mod ladder;
pub mod pair;
pub mod quote;

pub use ladder::{round8, LadderEntry, Side};
pub use pair::{PairError, PairFormat, TradingPair};
pub use quote::{Quote, ReferenceQuote};

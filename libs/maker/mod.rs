//! DEX Maker Bot core
//!
//! Discovers a fair price for a trading pair by averaging live tickers
//! across external venues, then seeds both sides of the exchange's book
//! with a compounding ladder of limit orders around that price.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

// Re-export commonly used items
pub use application::{
    plan_ladder, AggregatorError, LiquiditySeeder, MakerApp, SeedError, SeedOutcome,
    TickerAggregator,
};
pub use domain::{LadderEntry, PairFormat, Quote, ReferenceQuote, Side, TradingPair};
pub use infrastructure::{
    init_tracing, init_tracing_with_level, MakerConfig, VenueIndexCache, VenueRegistry,
};
pub use utils::ShutdownManager;

//! Application services: aggregation, ladder planning, and seeding.

pub mod aggregator;
pub mod facade;
pub mod planner;
pub mod seeder;

pub use aggregator::{AggregatorError, TickerAggregator};
pub use facade::MakerApp;
pub use planner::plan_ladder;
pub use seeder::{
    BudgetSummary, LiquiditySeeder, MarketTickers, PlacedOrder, SeedError, SeedOutcome,
    SubmitFailure,
};

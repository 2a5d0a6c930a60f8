//! Infrastructure: configuration, logging, venue clients, the persisted
//! venue index, and the exchange interfaces.

pub mod config;
pub mod dex;
pub mod gas;
pub mod logging;
pub mod venue_index;
pub mod venues;

pub use config::{ConfigError, DexConfig, MakerConfig, StrategyConfig};
pub use gas::GasOracle;
pub use logging::{init_tracing, init_tracing_with_level};
pub use venue_index::VenueIndexCache;
pub use venues::{VenueClient, VenueError, VenueRegistry};

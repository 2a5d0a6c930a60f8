//! Application Facade
//!
//! Public API for binaries (presentation layer). Wires configuration into
//! the venue registry, the persisted venue index, the aggregator, and the
//! liquidity seeder.

use crate::application::aggregator::TickerAggregator;
use crate::application::seeder::LiquiditySeeder;
use crate::domain::pair::TradingPair;
use crate::domain::quote::Quote;
use crate::infrastructure::config::MakerConfig;
use crate::infrastructure::dex::{DexApi, DexError, DexMarket, RestDexClient, RestTradingAccount, TradingAccount};
use crate::infrastructure::gas::GasOracle;
use crate::infrastructure::venue_index::VenueIndexCache;
use crate::infrastructure::venues::VenueRegistry;
use crate::utils::ShutdownManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Application facade for the liquidity seeding use case.
pub struct MakerApp {
    pub config: MakerConfig,
    pub seeder: LiquiditySeeder,
    pub shutdown: Arc<ShutdownManager>,
    registry: Arc<VenueRegistry>,
    index: Arc<RwLock<VenueIndexCache>>,
    aggregator: Arc<TickerAggregator>,
    dex: Arc<RestDexClient>,
    account: Arc<RestTradingAccount>,
}

impl MakerApp {
    /// Initialize the application from validated configuration.
    ///
    /// Must be called inside a tokio runtime: the shutdown signal handler
    /// is spawned here.
    pub fn new(config: MakerConfig) -> anyhow::Result<Self> {
        let registry = Arc::new(VenueRegistry::from_names(&config.venues)?);
        let index = Arc::new(RwLock::new(VenueIndexCache::load(&config.cache_path)?));
        let aggregator = Arc::new(TickerAggregator::new(
            Arc::clone(&registry),
            Arc::clone(&index),
            config.pair_format.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        ));

        let dex = Arc::new(RestDexClient::new(&config.dex.rest_endpoint));
        let account = Arc::new(RestTradingAccount::new(&config.dex.account_endpoint));

        let shutdown = Arc::new(ShutdownManager::new());
        shutdown.spawn_signal_handler();

        let seeder = LiquiditySeeder::new(
            Arc::clone(&aggregator),
            Arc::clone(&dex) as Arc<dyn DexApi>,
            Arc::clone(&account) as Arc<dyn TradingAccount>,
            config.pair_format.clone(),
            config.strategy.clone(),
            Arc::clone(&shutdown),
        );

        Ok(Self {
            config,
            seeder,
            shutdown,
            registry,
            index,
            aggregator,
            dex,
            account,
        })
    }

    /// Cross-venue reference quote for a pair.
    pub async fn aggregate_quote(
        &self,
        pair: &TradingPair,
    ) -> crate::application::aggregator::Result<Quote> {
        self.aggregator.get_reference_quote(pair).await
    }

    /// Exchange-side market metadata for a pair.
    pub async fn get_market(&self, pair: &TradingPair) -> Result<DexMarket, DexError> {
        let dex_symbol = self.config.pair_format.to_dex_symbol(pair);
        self.dex.get_market(&dex_symbol).await
    }

    /// Force a full venue index rebuild.
    pub async fn rebuild_index(&self) -> anyhow::Result<usize> {
        let mut index = self.index.write().await;
        Ok(index
            .rebuild(&self.registry, &self.config.pair_format)
            .await?)
    }

    /// Warn when the configured gas price is below the oracle safe-low.
    pub async fn check_gas_price(&self) {
        if let Some(gwei) = self.config.gas_price_gwei {
            GasOracle::new().check(gwei).await;
        }
    }

    /// Block until the account holds any native asset, polling every few
    /// seconds. Returns the observed balance, or `None` when shutdown was
    /// requested while waiting.
    pub async fn wait_for_funds(&self) -> Result<Option<f64>, DexError> {
        let mut balance = self.account.get_native_balance().await?;
        if balance > 0.0 {
            return Ok(Some(balance));
        }

        info!(
            "native balance is zero — send {} to the bot account to continue",
            self.config.pair_format.native
        );
        while self.shutdown.is_running() {
            self.shutdown
                .interruptible_sleep(Duration::from_secs(3))
                .await;
            balance = self.account.get_native_balance().await?;
            if balance > 0.0 {
                info!("{balance} {} received", self.config.pair_format.native);
                return Ok(Some(balance));
            }
        }

        Ok(None)
    }
}

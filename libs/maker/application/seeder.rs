//! Liquidity seeding orchestration.
//!
//! One run walks Preflight → Quote → Plan → Submit for a single market.
//! Market selection and repetition belong to the caller; validation
//! failures come back as typed errors so the caller decides whether to
//! ask again.

use crate::application::aggregator::{AggregatorError, TickerAggregator};
use crate::application::planner::plan_ladder;
use crate::domain::ladder::{round8, LadderEntry, Side};
use crate::domain::pair::{PairFormat, TradingPair};
use crate::domain::quote::{Quote, ReferenceQuote};
use crate::infrastructure::config::StrategyConfig;
use crate::infrastructure::dex::{DexApi, DexError, DexMarket, DexTicker, TradingAccount, TxId};
use crate::utils::ShutdownManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("no reference price for {pair}: aggregate and DEX ticker both unavailable")]
    NoReference { pair: String },

    #[error("{side} budget requires {required:.8} {token} but only {available:.8} is available")]
    InsufficientBalance {
        side: Side,
        token: String,
        required: f64,
        available: f64,
    },

    #[error("{action} failed for {token}: {source}")]
    Transaction {
        action: &'static str,
        token: String,
        #[source]
        source: DexError,
    },

    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

pub type Result<T> = std::result::Result<T, SeedError>;

/// Both candidate price sources for one market. Either may be missing;
/// never both.
#[derive(Debug)]
pub struct MarketTickers {
    pub aggregate: Option<Quote>,
    pub dex: Option<DexTicker>,
}

/// One accepted ladder order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub expires_at: i64,
    pub tx_id: TxId,
}

/// One ladder order the exchange rejected.
#[derive(Debug)]
pub struct SubmitFailure {
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub error: DexError,
}

/// Outcome of a seeding run: accepted orders plus per-entry failures.
/// Submission is best-effort, so both lists may be non-empty.
#[derive(Debug, Default)]
pub struct SeedOutcome {
    pub placed: Vec<PlacedOrder>,
    pub failures: Vec<SubmitFailure>,
}

impl SeedOutcome {
    fn merge(mut self, other: SeedOutcome) -> Self {
        self.placed.extend(other.placed);
        self.failures.extend(other.failures);
        self
    }
}

/// Quote-asset exposure of the requested budgets, logged before planning.
#[derive(Debug, Clone, Copy)]
pub struct BudgetSummary {
    pub bid_quote_total: f64,
    pub ask_quote_total: f64,
    pub bid_pct_of_quote: f64,
    pub ask_pct_of_base: f64,
}

pub struct LiquiditySeeder {
    aggregator: Arc<TickerAggregator>,
    dex: Arc<dyn DexApi>,
    account: Arc<dyn TradingAccount>,
    format: PairFormat,
    strategy: StrategyConfig,
    shutdown: Arc<ShutdownManager>,
}

impl LiquiditySeeder {
    pub fn new(
        aggregator: Arc<TickerAggregator>,
        dex: Arc<dyn DexApi>,
        account: Arc<dyn TradingAccount>,
        format: PairFormat,
        strategy: StrategyConfig,
        shutdown: Arc<ShutdownManager>,
    ) -> Self {
        Self {
            aggregator,
            dex,
            account,
            format,
            strategy,
            shutdown,
        }
    }

    /// Balance and allowance preparation for one market.
    ///
    /// When the market settles against the wrapped native asset and the
    /// native balance has reached the wrap threshold, most of it is
    /// wrapped — a reserve fraction stays behind for network fees. Both
    /// tokens then get an unlimited spend allowance if none exists. Every
    /// transaction is awaited before the next begins.
    pub async fn preflight(&self, pair: &TradingPair, market: &DexMarket) -> Result<()> {
        if self.format.is_wrapped_quote(pair) {
            let native_symbol = self.format.native.clone();
            let balance = self
                .account
                .get_native_balance()
                .await
                .map_err(|source| SeedError::Transaction {
                    action: "balance check",
                    token: native_symbol.clone(),
                    source,
                })?;

            if balance >= self.strategy.wrap_threshold {
                let amount = balance - round8(balance * self.strategy.wrap_reserve);
                info!(
                    "wrapping {amount:.8} {native_symbol} ({:.0}% reserved for fees)",
                    self.strategy.wrap_reserve * 100.0
                );
                let tx = self
                    .account
                    .wrap_native(amount)
                    .await
                    .map_err(|source| SeedError::Transaction {
                        action: "wrap",
                        token: native_symbol.clone(),
                        source,
                    })?;
                info!(tx = %tx, "wrap confirmed");
            }
        }

        let tokens = [
            (&pair.base, &market.base_token_address),
            (&pair.quote, &market.quote_token_address),
        ];
        for (symbol, address) in tokens {
            let allowance = self
                .account
                .get_allowance(address)
                .await
                .map_err(|source| SeedError::Transaction {
                    action: "allowance check",
                    token: symbol.clone(),
                    source,
                })?;

            if allowance <= 0.0 {
                info!("enabling {symbol} for trading");
                let tx = self
                    .account
                    .set_unlimited_allowance(address)
                    .await
                    .map_err(|source| SeedError::Transaction {
                        action: "allowance grant",
                        token: symbol.clone(),
                        source,
                    })?;
                info!(tx = %tx, "{symbol} enabled");
            }
        }

        Ok(())
    }

    /// Fetch both candidate price sources for a market.
    ///
    /// The aggregate quote and the exchange's own ticker are independent;
    /// either failing alone is logged and tolerated. Both failing means
    /// the run cannot proceed for this market.
    pub async fn fetch_reference(&self, pair: &TradingPair) -> Result<MarketTickers> {
        let aggregate = match self.aggregator.get_reference_quote(pair).await {
            Ok(quote) => {
                info!(
                    pair = %pair,
                    bid = ?quote.bid,
                    ask = ?quote.ask,
                    confidence = quote.confidence,
                    "aggregate quote"
                );
                Some(quote)
            }
            Err(e) => {
                warn!("aggregate quote unavailable for {pair}: {e}");
                None
            }
        };

        let dex_symbol = self.format.to_dex_symbol(pair);
        let dex = match self.dex.get_ticker(&dex_symbol).await {
            Ok(ticker) => {
                info!(pair = %dex_symbol, bid = ticker.bid, ask = ticker.ask, "DEX ticker");
                Some(ticker)
            }
            Err(e) => {
                warn!("DEX ticker unavailable for {dex_symbol}: {e}");
                None
            }
        };

        if aggregate.is_none() && dex.is_none() {
            return Err(SeedError::NoReference {
                pair: pair.to_string(),
            });
        }

        Ok(MarketTickers { aggregate, dex })
    }

    /// Check the requested budgets against current balances.
    ///
    /// The bid budget's quote-asset cost is estimated across the spread
    /// bands; it must fit the quote balance, and the ask budget must fit
    /// the base balance. Violations are typed errors — the caller decides
    /// whether to ask for new amounts. Nothing is clamped.
    pub async fn validate_budgets(
        &self,
        pair: &TradingPair,
        market: &DexMarket,
        reference: &ReferenceQuote,
        bid_budget: f64,
        ask_budget: f64,
    ) -> Result<BudgetSummary> {
        let quote_balance = self
            .account
            .get_token_balance(&market.quote_token_address)
            .await
            .map_err(|source| SeedError::Transaction {
                action: "balance check",
                token: pair.quote.clone(),
                source,
            })?;
        let base_balance = self
            .account
            .get_token_balance(&market.base_token_address)
            .await
            .map_err(|source| SeedError::Transaction {
                action: "balance check",
                token: pair.base.clone(),
                source,
            })?;

        let bands = self.strategy.spreads.len() as f64;
        let bid_quote_total = reference
            .usable_bid()
            .map(|bid| {
                self.strategy
                    .spreads
                    .iter()
                    .map(|s| (bid_budget / bands) * (bid - bid * s))
                    .sum()
            })
            .unwrap_or(0.0);
        let ask_quote_total = reference
            .usable_ask()
            .map(|ask| {
                self.strategy
                    .spreads
                    .iter()
                    .map(|s| (ask_budget / bands) * (ask + ask * s))
                    .sum()
            })
            .unwrap_or(0.0);

        if bid_budget > 0.0 && bid_quote_total > quote_balance {
            return Err(SeedError::InsufficientBalance {
                side: Side::Buy,
                token: pair.quote.clone(),
                required: bid_quote_total,
                available: quote_balance,
            });
        }
        if ask_budget > 0.0 && ask_budget > base_balance {
            return Err(SeedError::InsufficientBalance {
                side: Side::Sell,
                token: pair.base.clone(),
                required: ask_budget,
                available: base_balance,
            });
        }

        let summary = BudgetSummary {
            bid_quote_total,
            ask_quote_total,
            bid_pct_of_quote: percentage(bid_quote_total, quote_balance),
            ask_pct_of_base: percentage(ask_budget, base_balance),
        };

        info!(
            "buying {bid_budget} {} for ~{:.4} {} ({:.2}% of {} balance)",
            pair.base, summary.bid_quote_total, pair.quote, summary.bid_pct_of_quote, pair.quote
        );
        info!(
            "selling {ask_budget} {} for ~{:.4} {} ({:.2}% of {} balance)",
            pair.base, summary.ask_quote_total, pair.quote, summary.ask_pct_of_base, pair.base
        );
        if let Some(confidence) = reference.confidence {
            if confidence < 100.0 {
                warn!("reference ticker was built with {confidence:.2}% venue confidence");
            }
        }

        Ok(summary)
    }

    /// Plan and place both ladders for one market.
    ///
    /// A side without a usable reference price is skipped. The two sides
    /// submit concurrently; within a side, entries go out in planner order
    /// with a fixed pause between consecutive submissions. One rejected
    /// entry never cancels the rest of its sequence.
    pub async fn seed_liquidity(
        &self,
        pair: &TradingPair,
        market: &DexMarket,
        reference: &ReferenceQuote,
        bid_budget: f64,
        ask_budget: f64,
    ) -> Result<SeedOutcome> {
        self.validate_budgets(pair, market, reference, bid_budget, ask_budget)
            .await?;

        let expiration_secs = (self.strategy.expiration_hours * 3600.0) as i64;

        let buys = match reference.usable_bid() {
            Some(bid) => plan_ladder(
                Side::Buy,
                bid,
                bid_budget,
                &self.strategy.spreads,
                expiration_secs,
            ),
            None => {
                info!("no usable bid reference for {pair}, skipping buy side");
                Vec::new()
            }
        };
        let sells = match reference.usable_ask() {
            Some(ask) => plan_ladder(
                Side::Sell,
                ask,
                ask_budget,
                &self.strategy.spreads,
                expiration_secs,
            ),
            None => {
                info!("no usable ask reference for {pair}, skipping sell side");
                Vec::new()
            }
        };

        info!(
            "creating {} orders for {} ({} buys, {} sells)",
            buys.len() + sells.len(),
            market.id,
            buys.len(),
            sells.len()
        );

        let (buy_outcome, sell_outcome) = tokio::join!(
            self.submit_sequence(market, buys),
            self.submit_sequence(market, sells)
        );

        Ok(buy_outcome.merge(sell_outcome))
    }

    /// Submit one side's entries strictly in order, pausing between
    /// consecutive submissions so the exchange is never flooded.
    async fn submit_sequence(&self, market: &DexMarket, entries: Vec<LadderEntry>) -> SeedOutcome {
        let mut outcome = SeedOutcome::default();
        let delay = Duration::from_millis(self.strategy.submit_delay_ms);

        for (i, entry) in entries.into_iter().enumerate() {
            if i > 0 {
                self.shutdown.interruptible_sleep(delay).await;
            }
            if !self.shutdown.is_running() {
                warn!("shutdown requested, abandoning remaining {} entries", entry.side);
                break;
            }

            info!(
                "[limit order] {} {} {} at {}",
                entry.side, entry.quantity, market.id, entry.price
            );
            match self
                .account
                .submit_limit_order(
                    &market.id,
                    entry.side,
                    entry.quantity,
                    entry.price,
                    entry.expires_at,
                )
                .await
            {
                Ok(tx_id) => {
                    info!(tx = %tx_id, "order accepted");
                    outcome.placed.push(PlacedOrder {
                        side: entry.side,
                        price: entry.price,
                        quantity: entry.quantity,
                        expires_at: entry.expires_at,
                        tx_id,
                    });
                }
                Err(error) => {
                    warn!(
                        "order submission failed for {} {} at {}: {error}",
                        market.id, entry.side, entry.price
                    );
                    outcome.failures.push(SubmitFailure {
                        side: entry.side,
                        price: entry.price,
                        quantity: entry.quantity,
                        error,
                    });
                }
            }
        }

        outcome
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 || !whole.is_finite() {
        return 0.0;
    }
    let pct = part / whole * 100.0;
    if pct.is_nan() {
        0.0
    } else {
        pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregator::TickerAggregator;
    use crate::infrastructure::venue_index::VenueIndexCache;
    use crate::infrastructure::venues::testing::StubVenue;
    use crate::infrastructure::venues::{VenueClient, VenueRegistry};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::RwLock;

    /// Scriptable account double recording every call.
    struct StubAccount {
        native_balance: f64,
        token_balances: HashMap<String, f64>,
        allowances: HashMap<String, f64>,
        reject_orders_at: Option<usize>,
        calls: Mutex<Vec<String>>,
        orders: Mutex<Vec<(Side, f64, f64)>>,
    }

    impl StubAccount {
        fn new(native_balance: f64) -> Self {
            Self {
                native_balance,
                token_balances: HashMap::new(),
                allowances: HashMap::new(),
                reject_orders_at: None,
                calls: Mutex::new(Vec::new()),
                orders: Mutex::new(Vec::new()),
            }
        }

        fn with_token_balance(mut self, address: &str, balance: f64) -> Self {
            self.token_balances.insert(address.to_string(), balance);
            self
        }

        fn with_allowance(mut self, address: &str, allowance: f64) -> Self {
            self.allowances.insert(address.to_string(), allowance);
            self
        }

        fn rejecting_order(mut self, index: usize) -> Self {
            self.reject_orders_at = Some(index);
            self
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl TradingAccount for StubAccount {
        async fn get_native_balance(&self) -> crate::infrastructure::dex::Result<f64> {
            self.record("native_balance");
            Ok(self.native_balance)
        }

        async fn get_token_balance(
            &self,
            token_address: &str,
        ) -> crate::infrastructure::dex::Result<f64> {
            Ok(*self.token_balances.get(token_address).unwrap_or(&0.0))
        }

        async fn get_allowance(
            &self,
            token_address: &str,
        ) -> crate::infrastructure::dex::Result<f64> {
            Ok(*self.allowances.get(token_address).unwrap_or(&0.0))
        }

        async fn set_unlimited_allowance(
            &self,
            token_address: &str,
        ) -> crate::infrastructure::dex::Result<TxId> {
            self.record(format!("allow:{token_address}"));
            Ok(format!("0xallow-{token_address}"))
        }

        async fn wrap_native(&self, amount: f64) -> crate::infrastructure::dex::Result<TxId> {
            self.record(format!("wrap:{amount}"));
            Ok("0xwrap".to_string())
        }

        async fn submit_limit_order(
            &self,
            _market_id: &str,
            side: Side,
            quantity: f64,
            price: f64,
            _expires_at: i64,
        ) -> crate::infrastructure::dex::Result<TxId> {
            let mut orders = self.orders.lock().unwrap();
            let index = orders.len();
            orders.push((side, quantity, price));
            if self.reject_orders_at == Some(index) {
                return Err(DexError::Api("order rejected".to_string()));
            }
            Ok(format!("0xorder-{index}"))
        }
    }

    struct StubDex {
        ticker: Option<DexTicker>,
    }

    #[async_trait::async_trait]
    impl DexApi for StubDex {
        async fn get_market(
            &self,
            dex_symbol: &str,
        ) -> crate::infrastructure::dex::Result<DexMarket> {
            Ok(DexMarket {
                id: dex_symbol.to_string(),
                base_token_address: "0xbase".to_string(),
                quote_token_address: "0xquote".to_string(),
            })
        }

        async fn get_ticker(
            &self,
            dex_symbol: &str,
        ) -> crate::infrastructure::dex::Result<DexTicker> {
            self.ticker
                .ok_or_else(|| DexError::MarketNotFound(dex_symbol.to_string()))
        }
    }

    fn strategy() -> StrategyConfig {
        StrategyConfig {
            spreads: vec![0.01, 0.02],
            expiration_hours: 1.0,
            wrap_threshold: 0.5,
            wrap_reserve: 0.02,
            submit_delay_ms: 0,
        }
    }

    fn market() -> DexMarket {
        DexMarket {
            id: "ZRX-WETH".to_string(),
            base_token_address: "0xbase".to_string(),
            quote_token_address: "0xquote".to_string(),
        }
    }

    fn pair() -> TradingPair {
        TradingPair::parse("ZRX/WETH").unwrap()
    }

    fn seeder_with(
        account: StubAccount,
        dex_ticker: Option<DexTicker>,
        venues: Vec<StubVenue>,
    ) -> (LiquiditySeeder, Arc<StubAccount>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(VenueRegistry::from_clients(
            venues
                .into_iter()
                .map(|v| Box::new(v) as Box<dyn VenueClient>)
                .collect(),
        ));
        let index = Arc::new(RwLock::new(
            VenueIndexCache::load(dir.path().join("index.json")).unwrap(),
        ));
        let aggregator = Arc::new(TickerAggregator::new(
            registry,
            index,
            PairFormat::default(),
            Duration::from_secs(1),
        ));
        let account = Arc::new(account);
        let seeder = LiquiditySeeder::new(
            aggregator,
            Arc::new(StubDex { ticker: dex_ticker }),
            account.clone(),
            PairFormat::default(),
            strategy(),
            Arc::new(ShutdownManager::new()),
        );
        (seeder, account, dir)
    }

    #[tokio::test]
    async fn preflight_wraps_most_of_the_native_balance() {
        let account = StubAccount::new(1.0)
            .with_allowance("0xbase", 1e9)
            .with_allowance("0xquote", 1e9);
        let (seeder, account, _dir) = seeder_with(account, None, Vec::new());

        seeder.preflight(&pair(), &market()).await.unwrap();

        // 1.0 native at threshold 0.5 wraps 98%.
        assert_eq!(account.calls(), vec!["native_balance", "wrap:0.98"]);
    }

    #[tokio::test]
    async fn preflight_skips_wrap_below_threshold_and_grants_allowances() {
        let account = StubAccount::new(0.1).with_allowance("0xbase", 1e9);
        let (seeder, account, _dir) = seeder_with(account, None, Vec::new());

        seeder.preflight(&pair(), &market()).await.unwrap();

        // No wrap; only the quote token (zero allowance) gets enabled.
        assert_eq!(account.calls(), vec!["native_balance", "allow:0xquote"]);
    }

    #[tokio::test]
    async fn fetch_reference_tolerates_one_missing_source() {
        let account = StubAccount::new(0.0);
        let (seeder, _account, _dir) = seeder_with(
            account,
            Some(DexTicker {
                bid: 0.01,
                ask: 0.02,
            }),
            vec![StubVenue::listing("binance", &[("MKR", "ETH")])],
        );

        // Aggregator has no venues for ZRX; the DEX ticker carries the run.
        let tickers = seeder.fetch_reference(&pair()).await.unwrap();
        assert!(tickers.aggregate.is_none());
        assert!(tickers.dex.is_some());
    }

    #[tokio::test]
    async fn fetch_reference_fails_when_both_sources_fail() {
        let account = StubAccount::new(0.0);
        let (seeder, _account, _dir) = seeder_with(
            account,
            None,
            vec![StubVenue::listing("binance", &[("MKR", "ETH")])],
        );

        let err = seeder.fetch_reference(&pair()).await.unwrap_err();
        assert!(matches!(err, SeedError::NoReference { .. }));
    }

    #[tokio::test]
    async fn over_budget_bid_is_rejected() {
        // Quote balance 1, but 100 base at ~1.0 needs ~98.5 quote.
        let account = StubAccount::new(0.0)
            .with_token_balance("0xquote", 1.0)
            .with_token_balance("0xbase", 1000.0);
        let (seeder, _account, _dir) = seeder_with(account, None, Vec::new());

        let reference = ReferenceQuote::manual(1.0, 1.1);
        let err = seeder
            .validate_budgets(&pair(), &market(), &reference, 100.0, 0.0)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SeedError::InsufficientBalance {
                side: Side::Buy,
                ref token,
                ..
            } if token == "WETH"
        ));
    }

    #[tokio::test]
    async fn over_budget_ask_is_rejected() {
        let account = StubAccount::new(0.0)
            .with_token_balance("0xquote", 1000.0)
            .with_token_balance("0xbase", 5.0);
        let (seeder, _account, _dir) = seeder_with(account, None, Vec::new());

        let reference = ReferenceQuote::manual(1.0, 1.1);
        let err = seeder
            .validate_budgets(&pair(), &market(), &reference, 0.0, 10.0)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SeedError::InsufficientBalance {
                side: Side::Sell,
                ref token,
                ..
            } if token == "ZRX"
        ));
    }

    #[tokio::test]
    async fn seeds_both_sides_and_survives_one_rejection() {
        let account = StubAccount::new(0.0)
            .with_token_balance("0xquote", 10_000.0)
            .with_token_balance("0xbase", 10_000.0)
            .rejecting_order(1);
        let (seeder, account, _dir) = seeder_with(account, None, Vec::new());

        let reference = ReferenceQuote::manual(100.0, 101.0);
        let outcome = seeder
            .seed_liquidity(&pair(), &market(), &reference, 10.0, 10.0)
            .await
            .unwrap();

        // 2 spreads per side; one submission rejected, the rest placed.
        assert_eq!(outcome.placed.len(), 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(account.orders.lock().unwrap().len(), 4);

        // Each side's own sequence stayed in planner order.
        let buy_prices: Vec<f64> = account
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|(side, _, _)| *side == Side::Buy)
            .map(|(_, _, price)| *price)
            .collect();
        assert_eq!(buy_prices, vec![99.0, 97.02]);
    }

    #[tokio::test]
    async fn missing_bid_reference_skips_buy_side() {
        let account = StubAccount::new(0.0)
            .with_token_balance("0xquote", 10_000.0)
            .with_token_balance("0xbase", 10_000.0);
        let (seeder, account, _dir) = seeder_with(account, None, Vec::new());

        let reference = ReferenceQuote {
            bid: None,
            ask: Some(101.0),
            confidence: Some(0.0),
        };
        let outcome = seeder
            .seed_liquidity(&pair(), &market(), &reference, 10.0, 10.0)
            .await
            .unwrap();

        assert_eq!(outcome.placed.len(), 2);
        assert!(outcome
            .placed
            .iter()
            .all(|order| order.side == Side::Sell));
        assert!(account
            .orders
            .lock()
            .unwrap()
            .iter()
            .all(|(side, _, _)| *side == Side::Sell));
    }
}

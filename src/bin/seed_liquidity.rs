//! Liquidity seeding binary.
//!
//! Seeds both sides of one market's book with a spread ladder around a
//! chosen reference price, then exits. Run it again to seed another
//! market.
//!
//! Usage:
//!   seed_liquidity <PAIR> <BID_BUDGET> <ASK_BUDGET> [SOURCE]
//!
//!   PAIR        market, e.g. ZRX/ETH or ZRX-WETH
//!   BID_BUDGET  base amount to buy across the ladder
//!   ASK_BUDGET  base amount to sell across the ladder
//!   SOURCE      price source: "aggregate" (default), "dex", or a manual
//!               "<bid>:<ask>" pair

use anyhow::{bail, Context, Result};
use dex_maker_bot::bin_common::{load_config_from_env, parse_args, ConfigType};
use maker::application::MakerApp;
use maker::domain::{ReferenceQuote, TradingPair};
use maker::infrastructure::{init_tracing_with_level, MakerConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config
    let config_path = load_config_from_env(ConfigType::Maker);
    let config = MakerConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path:?}"))?;

    // Initialize logging
    init_tracing_with_level(&config.log_level);
    config.log();

    let args = parse_args();
    if args.len() < 3 {
        bail!("usage: seed_liquidity <PAIR> <BID_BUDGET> <ASK_BUDGET> [aggregate|dex|<bid>:<ask>]");
    }

    let pair = TradingPair::parse(&args[0])?;
    let bid_budget: f64 = args[1]
        .parse()
        .context("BID_BUDGET must be a decimal amount")?;
    let ask_budget: f64 = args[2]
        .parse()
        .context("ASK_BUDGET must be a decimal amount")?;
    let source = args.get(3).map(String::as_str).unwrap_or("aggregate");

    let app = MakerApp::new(config)?;

    // Gas price sanity check; advisory only
    app.check_gas_price().await;

    // The account needs native asset for transaction fees before anything
    // else can happen
    if app.wait_for_funds().await?.is_none() {
        bail!("shutdown requested while waiting for funds");
    }

    info!("selected market: {pair}");
    let market = app
        .get_market(&pair)
        .await
        .with_context(|| format!("looking up market for {pair}"))?;

    info!("verifying balances and allowances...");
    app.seeder.preflight(&pair, &market).await?;

    info!("retrieving price information...");
    let tickers = app.seeder.fetch_reference(&pair).await?;

    let reference = match source {
        "aggregate" => {
            let quote = tickers
                .aggregate
                .as_ref()
                .context("aggregate quote unavailable; try SOURCE=dex")?;
            ReferenceQuote::from_aggregate(quote)
        }
        "dex" => {
            let ticker = tickers
                .dex
                .as_ref()
                .context("DEX ticker unavailable; try SOURCE=aggregate")?;
            ReferenceQuote::manual(ticker.bid, ticker.ask)
        }
        manual => {
            let (bid, ask) = manual
                .split_once(':')
                .context("SOURCE must be 'aggregate', 'dex', or '<bid>:<ask>'")?;
            ReferenceQuote::manual(
                bid.parse().context("manual bid must be a decimal price")?,
                ask.parse().context("manual ask must be a decimal price")?,
            )
        }
    };

    let outcome = app
        .seeder
        .seed_liquidity(&pair, &market, &reference, bid_budget, ask_budget)
        .await?;

    info!(
        "seeding complete: {} orders placed, {} failed",
        outcome.placed.len(),
        outcome.failures.len()
    );
    for failure in &outcome.failures {
        warn!(
            "not placed: {} {} at {} ({})",
            failure.side, failure.quantity, failure.price, failure.error
        );
    }

    Ok(())
}

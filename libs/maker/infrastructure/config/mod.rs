//! Bot configuration loaded from YAML with environment overrides.

use crate::domain::pair::PairFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main maker-bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Price venues to aggregate, in priority order.
    pub venues: Vec<String>,

    #[serde(default)]
    pub pair_format: PairFormat,

    /// Path of the persisted venue index.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Upper bound on one venue ticker fetch during aggregation.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Gas price used by the account service, checked against the oracle
    /// safe-low at startup when set.
    #[serde(default)]
    pub gas_price_gwei: Option<f64>,

    pub dex: DexConfig,

    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    /// Exchange market-data API.
    pub rest_endpoint: String,

    /// Account service holding the keys.
    pub account_endpoint: String,
}

/// Ladder strategy parameters, immutable for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Spread fractions per ladder band, in placement order.
    pub spreads: Vec<f64>,

    /// Order lifetime.
    pub expiration_hours: f64,

    /// Native balance at which preflight wraps into the tradable form.
    pub wrap_threshold: f64,

    /// Fraction of the native balance kept unwrapped for network fees.
    #[serde(default = "default_wrap_reserve")]
    pub wrap_reserve: f64,

    /// Pause between consecutive order submissions on one side.
    #[serde(default = "default_submit_delay")]
    pub submit_delay_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_path() -> String {
    ".markets-cache.json".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_wrap_reserve() -> f64 {
    0.02
}

fn default_submit_delay() -> u64 {
    2000
}

impl MakerConfig {
    /// Load configuration from a YAML file.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: MakerConfig = serde_yaml::from_str(&yaml_content)?;

        // Endpoint overrides from the environment, if present
        if let Ok(endpoint) = std::env::var("DEX_REST_ENDPOINT") {
            config.dex.rest_endpoint = endpoint;
        }
        if let Ok(endpoint) = std::env::var("ACCOUNT_ENDPOINT") {
            config.dex.account_endpoint = endpoint;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.venues.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one venue must be configured".to_string(),
            ));
        }

        if self.pair_format.native.is_empty() || self.pair_format.wrapped.is_empty() {
            return Err(ConfigError::ValidationError(
                "pair_format symbols must be non-empty".to_string(),
            ));
        }
        if self.pair_format.native == self.pair_format.wrapped {
            return Err(ConfigError::ValidationError(
                "pair_format native and wrapped symbols must differ".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.strategy.spreads.is_empty() {
            return Err(ConfigError::ValidationError(
                "strategy.spreads must not be empty".to_string(),
            ));
        }
        if self
            .strategy
            .spreads
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0 || *s >= 1.0)
        {
            return Err(ConfigError::ValidationError(
                "each spread must be a fraction between 0 and 1".to_string(),
            ));
        }

        if self.strategy.expiration_hours <= 0.0 {
            return Err(ConfigError::ValidationError(
                "strategy.expiration_hours must be greater than 0".to_string(),
            ));
        }

        if self.strategy.wrap_threshold < 0.0 {
            return Err(ConfigError::ValidationError(
                "strategy.wrap_threshold must not be negative".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.strategy.wrap_reserve) {
            return Err(ConfigError::ValidationError(
                "strategy.wrap_reserve must be within [0, 1)".to_string(),
            ));
        }

        Ok(())
    }

    /// Log the effective configuration at startup.
    pub fn log(&self) {
        info!(
            "config: venues=[{}], spreads={:?}, expiration={}h, wrap_threshold={}, cache={}",
            self.venues.join(", "),
            self.strategy.spreads,
            self.strategy.expiration_hours,
            self.strategy.wrap_threshold,
            self.cache_path,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_yaml() -> String {
        r#"
venues: [binance, kraken, coinbase]
dex:
  rest_endpoint: "https://api.dex.example/v3"
  account_endpoint: "http://127.0.0.1:8780"
strategy:
  spreads: [0.01, 0.02, 0.03]
  expiration_hours: 24
  wrap_threshold: 0.5
"#
        .to_string()
    }

    fn parse(yaml: &str) -> MakerConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_fill_in_omitted_fields() {
        let config = parse(&base_yaml());
        config.validate().unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.cache_path, ".markets-cache.json");
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.strategy.wrap_reserve, 0.02);
        assert_eq!(config.strategy.submit_delay_ms, 2000);
        assert_eq!(config.pair_format.native, "ETH");
        assert_eq!(config.pair_format.wrapped, "WETH");
    }

    #[test]
    fn rejects_empty_venues() {
        let yaml = base_yaml().replace("[binance, kraken, coinbase]", "[]");
        assert!(matches!(
            parse(&yaml).validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_spread() {
        let yaml = base_yaml().replace("[0.01, 0.02, 0.03]", "[0.01, 1.5]");
        assert!(parse(&yaml).validate().is_err());

        let yaml = base_yaml().replace("[0.01, 0.02, 0.03]", "[0.0]");
        assert!(parse(&yaml).validate().is_err());
    }

    #[test]
    fn rejects_non_positive_expiration() {
        let yaml = base_yaml().replace("expiration_hours: 24", "expiration_hours: 0");
        assert!(parse(&yaml).validate().is_err());
    }

    #[test]
    fn rejects_identical_native_and_wrapped() {
        let yaml = format!(
            "{}pair_format:\n  native: WETH\n  wrapped: WETH\n",
            base_yaml()
        );
        assert!(parse(&yaml).validate().is_err());
    }
}

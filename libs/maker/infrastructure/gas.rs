//! Gas price sanity check against a public gas oracle.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_URL: &str = "https://ethgasstation.info/json/ethgasAPI.json";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// The oracle reports prices in tenths of gwei.
#[derive(Debug, Deserialize)]
struct OracleResponse {
    #[serde(rename = "safeLow")]
    safe_low: f64,
}

pub struct GasOracle {
    url: String,
    client: Client,
}

impl GasOracle {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    /// Warn when the configured gas price sits below the oracle's safe-low.
    /// Oracle unavailability is logged and otherwise ignored — this check
    /// never blocks a run.
    pub async fn check(&self, configured_gwei: f64) {
        match self.fetch_safe_low_gwei().await {
            Ok(safe_low) if configured_gwei < safe_low => {
                warn!(
                    "configured gas price {configured_gwei} gwei is below the oracle safe-low of {safe_low} gwei"
                );
            }
            Ok(safe_low) => {
                debug!("gas price {configured_gwei} gwei >= safe-low {safe_low} gwei");
            }
            Err(e) => {
                warn!("gas oracle unavailable, skipping gas price check: {e}");
            }
        }
    }

    async fn fetch_safe_low_gwei(&self) -> Result<f64, reqwest::Error> {
        let response: OracleResponse = self
            .client
            .get(&self.url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.safe_low / 10.0)
    }
}

impl Default for GasOracle {
    fn default() -> Self {
        Self::new()
    }
}

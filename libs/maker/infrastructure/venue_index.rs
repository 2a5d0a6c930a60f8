//! Pair → venue index with JSON file persistence.
//!
//! The index remembers which venues list each pair so aggregation does not
//! re-crawl every catalogue per quote. It is loaded once at startup, held
//! in memory for the process lifetime, and refreshed only by an explicit
//! rebuild that fully replaces the previous contents. Staleness between
//! rebuilds is tolerated.

use crate::domain::pair::PairFormat;
use crate::infrastructure::venues::VenueRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("failed to access index file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse index file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// On-disk shape: a single object keyed `markets`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedIndex {
    markets: HashMap<String, Vec<String>>,
}

/// File-backed index of which venues list each pair.
pub struct VenueIndexCache {
    index: PersistedIndex,
    file_path: PathBuf,
}

impl VenueIndexCache {
    /// Load the index from a JSON file, starting empty when the file is
    /// missing or blank.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let index = if file_path.exists() {
            debug!("loading venue index from {:?}", file_path);
            let content = fs::read_to_string(&file_path)?;
            if content.trim().is_empty() {
                PersistedIndex::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("venue index file not found, starting empty");
            PersistedIndex::default()
        };

        debug!("loaded venue index with {} pairs", index.markets.len());

        Ok(Self { index, file_path })
    }

    /// Venues known to list `pair` (feed-format key), if any.
    pub fn lookup(&self, pair: &str) -> Option<&[String]> {
        self.index.markets.get(pair).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.index.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.markets.is_empty()
    }

    /// Re-crawl every configured venue's catalogue and replace the index.
    ///
    /// Only pairs quoted against the native quote asset are retained. A
    /// venue whose catalogue fetch fails is skipped and contributes no
    /// entries; it never aborts the rebuild. The new index fully replaces
    /// the previous one, in memory and on disk.
    pub async fn rebuild(
        &mut self,
        registry: &VenueRegistry,
        format: &PairFormat,
    ) -> Result<usize> {
        let mut markets: HashMap<String, Vec<String>> = HashMap::new();

        for venue in registry.iter() {
            match venue.fetch_markets().await {
                Ok(pairs) => {
                    let mut kept = 0usize;
                    for pair in pairs {
                        if !pair.quote.eq_ignore_ascii_case(&format.native) {
                            continue;
                        }
                        let key = format!(
                            "{}/{}",
                            pair.base.to_uppercase(),
                            pair.quote.to_uppercase()
                        );
                        markets.entry(key).or_default().push(venue.id().to_string());
                        kept += 1;
                    }
                    debug!(venue = venue.id(), kept, "indexed venue catalogue");
                }
                Err(e) => {
                    warn!(venue = venue.id(), "catalogue fetch failed, skipping venue: {e}");
                }
            }
        }

        self.index = PersistedIndex { markets };
        self.save()?;

        info!("venue index rebuilt: {} pairs", self.index.markets.len());
        Ok(self.index.markets.len())
    }

    /// Whole-file replace: write a sibling temp file, then rename over the
    /// previous index so readers never observe a partial write.
    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.index)?;
        let tmp_path = self.file_path.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.file_path)?;
        Ok(())
    }
}

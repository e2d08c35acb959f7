use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dividend::DividendRecord;

/// Dividend data for one symbol plus provenance metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Ticker symbol the result belongs to
    pub symbol: String,

    /// Records in the provider's order (most-recent-first when dated)
    pub dividends: Vec<DividendRecord>,

    pub total_count: usize,

    /// Whether the result was served from the cache
    pub cached: bool,

    /// When the cached copy expires
    pub cache_expires_at: Option<DateTime<Utc>>,

    /// Every provider attempted (deduplicated, sorted)
    pub sources_attempted: Vec<String>,

    /// Provider that supplied the records
    pub successful_source: Option<String>,
}

impl RetrievalResult {
    /// A "no data found" result.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            dividends: Vec::new(),
            total_count: 0,
            cached: false,
            cache_expires_at: None,
            sources_attempted: Vec::new(),
            successful_source: None,
        }
    }

    /// A result carrying the records of the provider that supplied them.
    pub fn from_records(
        symbol: impl Into<String>,
        dividends: Vec<DividendRecord>,
        source: impl Into<String>,
    ) -> Self {
        let total_count = dividends.len();
        let successful_source = (total_count > 0).then(|| source.into());
        Self {
            symbol: symbol.into(),
            dividends,
            total_count,
            cached: false,
            cache_expires_at: None,
            sources_attempted: Vec::new(),
            successful_source,
        }
    }

    /// Replace the attempted sources, deduplicating them.
    pub fn with_sources_attempted<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = sources.into_iter().map(Into::into).collect();
        self.sources_attempted = unique.into_iter().collect();
        self
    }

    pub fn has_data(&self) -> bool {
        self.total_count > 0
    }
}

//! Dividend provider abstractions and implementations.
//!
//! This module contains:
//! - The `DividendProvider` trait that all providers implement
//! - Per-provider request pacing and rate limiting configuration
//! - Field parsing helpers shared by the scraping providers
//! - Concrete provider implementations (Yahoo, MarketWatch)
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: The orchestrator only sees `DividendProvider`
//! - **Extensible**: New sources can be added by implementing `DividendProvider`
//! - **Polite**: Every provider paces its own requests with a `RequestPacer`

mod capabilities;
mod http;
mod pacer;
pub mod parsing;
mod traits;

pub mod marketwatch;
pub mod yahoo;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use capabilities::{RateLimit, DEFAULT_REQUEST_TIMEOUT};
pub use pacer::RequestPacer;
pub use traits::DividendProvider;

use marketwatch::MarketWatchProvider;
use yahoo::YahooProvider;

/// The closed set of built-in providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Yahoo,
    MarketWatch,
}

impl ProviderKind {
    /// All built-in providers in default priority order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Yahoo, ProviderKind::MarketWatch];

    /// Stable name used to select the provider.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::MarketWatch => "marketwatch",
        }
    }

    /// Construct the provider. Construction is cheap; see `prepare`.
    pub fn build(self) -> Arc<dyn DividendProvider> {
        match self {
            Self::Yahoo => Arc::new(YahooProvider::new()),
            Self::MarketWatch => Arc::new(MarketWatchProvider::new()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.name().parse::<ProviderKind>(), Ok(kind));
        }
        assert_eq!(" Yahoo ".parse::<ProviderKind>(), Ok(ProviderKind::Yahoo));
        assert_eq!("google".parse::<ProviderKind>(), Err("google".to_string()));
    }

    #[test]
    fn test_build_matches_kind() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.build().id(), kind.name());
        }
    }

    #[test]
    fn test_builtin_priorities_follow_declaration_order() {
        let priorities: Vec<u8> = ProviderKind::ALL
            .iter()
            .map(|kind| kind.build().priority())
            .collect();
        assert!(priorities.windows(2).all(|w| w[0] < w[1]));
    }
}

//! Dividend Calendar Data Crate
//!
//! This crate retrieves dividend histories by querying several independent,
//! unreliable providers, with caching and per-provider health tracking.
//!
//! # Overview
//!
//! The data crate supports:
//! - Multiple providers: Yahoo Finance, MarketWatch
//! - Sequential fallback in priority order, then a concurrent race
//! - Per-provider request pacing
//! - A bounded, TTL-based result cache
//! - Concurrent batch retrieval with per-symbol isolation
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |     Caller       | --> | DividendService  |  (two-phase orchestration)
//! +------------------+     +------------------+
//!                            |       |       |
//!                            v       v       v
//!                  +-----------+ +--------+ +---------------+
//!                  |   Cache   | | Health | |   Registry    |
//!                  +-----------+ +--------+ +---------------+
//!                                                  |
//!                                                  v
//!                                         +------------------+
//!                                         |    Provider      |  (Yahoo, MarketWatch)
//!                                         +------------------+
//!                                                  |
//!                                                  v
//!                                         +------------------+
//!                                         | DividendRecord   |
//!                                         +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`DividendService`] - Entry point: `get`, `get_batch`, `stats`
//! - [`Symbol`] - Canonical ticker symbol
//! - [`DividendRecord`] - One dividend event
//! - [`RetrievalResult`] - Records of one symbol plus provenance
//! - [`RetrievalError`] - Errors surfaced to callers
//! - [`DividendProvider`] - Trait implemented by every source

pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    DividendKind, DividendRecord, RetrievalResult, Symbol, SymbolError, DEFAULT_CURRENCY,
};

// Re-export error types
pub use errors::{ErrorKind, ProviderError, RetrievalError, RetryClass};

// Re-export provider types
pub use provider::marketwatch::MarketWatchProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{DividendProvider, ProviderKind, RateLimit, RequestPacer};

// Re-export service types
pub use cache::{CacheStats, DividendCache};
pub use config::ServiceConfig;
pub use orchestrator::{ConfigSummary, DividendService, ServiceStats};
pub use registry::{HealthTracker, ProviderHealthSnapshot, ProviderRegistry};

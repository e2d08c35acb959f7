//! Dividend data models
//!
//! This module contains the core data types for dividend retrieval:
//! - `types` - Shared constants (DEFAULT_CURRENCY)
//! - `symbol` - Canonical ticker symbol (Symbol) and its validation errors
//! - `dividend` - Dividend records as produced by providers (DividendRecord, DividendKind)
//! - `retrieval` - Per-symbol result with provenance metadata (RetrievalResult)

mod dividend;
mod retrieval;
mod symbol;
mod types;

pub use dividend::{sort_most_recent_first, DividendKind, DividendRecord};
pub use retrieval::RetrievalResult;
pub use symbol::{Symbol, SymbolError};
pub use types::DEFAULT_CURRENCY;

//! Dividend provider trait definitions.
//!
//! This module defines the core `DividendProvider` trait that all
//! dividend data sources implement.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::models::{DividendRecord, Symbol};

use super::capabilities::RateLimit;

/// Trait for dividend data providers.
///
/// Implement this trait to add support for a new dividend source.
/// The registry uses the provider's id and priority to select and order it;
/// the orchestrator never looks past this interface.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use dividend_calendar_data::provider::{DividendProvider, RateLimit};
///
/// struct MyProvider {
///     pacer: RequestPacer,
/// }
///
/// #[async_trait]
/// impl DividendProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "my_provider"
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     async fn fetch_dividends(
///         &self,
///         symbol: &Symbol,
///         cancel: &CancellationToken,
///     ) -> Result<Vec<DividendRecord>, ProviderError> {
///         self.pacer.wait_turn(cancel).await?;
///         // ... issue the request
///     }
/// }
/// ```
#[async_trait]
pub trait DividendProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// A lowercase constant like "yahoo" or "marketwatch". Callers select
    /// providers by this name; it also keys health statistics.
    fn id(&self) -> &'static str;

    /// Provider priority for default ordering.
    ///
    /// Lower values = higher priority. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Rate limiting configuration.
    fn rate_limit(&self) -> RateLimit;

    /// Perform expensive one-time setup (HTTP clients, sessions).
    ///
    /// Called by [`ProviderRegistry::ensure_ready`](crate::registry::ProviderRegistry::ensure_ready).
    /// Must be idempotent. The default does nothing.
    async fn prepare(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Fetch dividend records for a canonical symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Canonical symbol; providers re-validate it defensively
    /// * `cancel` - Checked before each request and while waiting on the pacer
    ///
    /// # Returns
    ///
    /// Zero or more records, most recent first when they carry ex-dates.
    /// An unknown symbol or a symbol without dividends is `Ok(vec![])`.
    async fn fetch_dividends(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<DividendRecord>, ProviderError>;
}

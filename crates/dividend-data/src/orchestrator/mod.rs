//! Dividend retrieval service.
//!
//! [`DividendService`] answers "dividend history for symbol X using providers
//! {P}" with a two-phase strategy:
//!
//! 1. **Sequential phase**: providers are tried one at a time in priority
//!    order. The first one returning at least one record wins. A rate-limited
//!    provider triggers a short backoff before the next one.
//! 2. **Concurrent phase**: if the sequential phase found nothing, providers
//!    not attempted yet are raced (see [`race_providers`]).
//!
//! Results with data are cached. Provider failures never surface to callers:
//! when every provider fails the result is simply empty.

mod race;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStats, DividendCache};
use crate::config::ServiceConfig;
use crate::errors::{ProviderError, RetrievalError, RetryClass};
use crate::models::{DividendRecord, RetrievalResult, Symbol};
use crate::provider::DividendProvider;
use crate::registry::{HealthTracker, ProviderHealthSnapshot, ProviderRegistry};

pub use race::{race_providers, RaceLimits};

/// Effective configuration as reported by [`DividendService::stats`].
#[derive(Clone, Debug, Serialize)]
pub struct ConfigSummary {
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub available_providers: Vec<String>,
    pub default_priority: Vec<String>,
    pub max_concurrent_fallback: usize,
    pub per_attempt_timeout_seconds: u64,
    pub phase_timeout_seconds: u64,
    pub sequential_retry_backoff_seconds: u64,
}

/// Service-wide statistics.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceStats {
    pub cache: Option<CacheStats>,
    pub providers: BTreeMap<String, ProviderHealthSnapshot>,
    pub config: ConfigSummary,
}

/// How the sequential phase ended.
enum SequentialOutcome {
    Found(&'static str, Vec<DividendRecord>),
    /// Every provider was tried without data
    Exhausted,
    /// Cancelled, or an error no other provider can fix
    Stopped,
}

/// Multi-source dividend retrieval service.
///
/// Cheap to clone; clones share the registry, cache, health tracker and
/// shutdown token.
#[derive(Clone)]
pub struct DividendService {
    registry: Arc<ProviderRegistry>,
    /// `None` when caching is disabled by configuration
    cache: Option<Arc<DividendCache>>,
    health: Arc<HealthTracker>,
    config: Arc<ServiceConfig>,
    shutdown: CancellationToken,
}

impl DividendService {
    /// Create a service from explicitly constructed collaborators.
    ///
    /// The cache is ignored when `config.use_cache` is false.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        cache: Arc<DividendCache>,
        health: Arc<HealthTracker>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            registry,
            cache: config.use_cache.then_some(cache),
            health,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a service over the built-in providers.
    pub fn with_builtin_providers(config: ServiceConfig) -> Self {
        let registry = ProviderRegistry::builtin();
        let health = HealthTracker::new(registry.names());
        let cache = DividendCache::new(config.cache_max_size, config.cache_ttl);
        Self::new(Arc::new(registry), Arc::new(cache), Arc::new(health), config)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Prepare every provider. Idempotent; also done lazily by `get`.
    pub async fn ensure_ready(&self) -> Result<(), RetrievalError> {
        self.registry.ensure_ready().await
    }

    /// Retrieve the dividend history of one symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Raw ticker as supplied by the caller
    /// * `sources` - Provider names in the desired order; `None` or empty for all
    /// * `use_cache` - Whether this call may read and fill the cache
    ///
    /// # Errors
    ///
    /// `InvalidSymbol`, `InvalidSourceList`, or `ProviderUnavailable` when no
    /// provider can be attempted. All providers failing is not an error.
    pub async fn get(
        &self,
        symbol: &str,
        sources: Option<&[String]>,
        use_cache: bool,
    ) -> Result<RetrievalResult, RetrievalError> {
        let canonical = Symbol::parse(symbol).map_err(|e| RetrievalError::InvalidSymbol {
            symbol: symbol.to_string(),
            message: e.to_string(),
        })?;
        let providers = self.registry.resolve(sources)?;

        if self.shutdown.is_cancelled() {
            return Err(RetrievalError::ProviderUnavailable {
                message: "Service is shut down".to_string(),
                sources_attempted: Vec::new(),
            });
        }
        if providers.is_empty() {
            return Err(RetrievalError::ProviderUnavailable {
                message: "No providers available".to_string(),
                sources_attempted: Vec::new(),
            });
        }

        let single_source = match sources {
            Some(requested) if !requested.is_empty() && providers.len() == 1 => {
                Some(providers[0].id())
            }
            _ => None,
        };
        let cache = self.cache.as_ref().filter(|_| use_cache);

        // A hit needs no provider, prepared or not
        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&canonical, single_source) {
                debug!("Cache hit for {}", canonical);
                return Ok(hit);
            }
        }

        self.registry.ensure_ready().await?;

        let result = self.retrieve(&canonical, providers).await;

        if let Some(cache) = cache {
            if result.has_data() {
                cache.set(&canonical, &result, single_source, None);
            }
        }
        Ok(result)
    }

    /// Run both phases for an already validated symbol.
    async fn retrieve(
        &self,
        symbol: &Symbol,
        providers: Vec<Arc<dyn DividendProvider>>,
    ) -> RetrievalResult {
        let cancel = self.shutdown.child_token();
        let mut attempted: Vec<&'static str> = Vec::new();

        let sequential_count = self
            .config
            .max_sequential_attempts
            .unwrap_or(providers.len())
            .min(providers.len());
        let (sequential, remaining) = providers.split_at(sequential_count);
        let raced: Vec<_> = remaining
            .iter()
            .take(self.config.max_concurrent_fallback)
            .cloned()
            .collect();

        let sequential_outcome = self
            .sequential_phase(symbol, sequential, !raced.is_empty(), &cancel, &mut attempted)
            .await;
        let (mut winner, keep_going) = match sequential_outcome {
            SequentialOutcome::Found(source, records) => (Some((source, records)), false),
            SequentialOutcome::Exhausted => (None, true),
            SequentialOutcome::Stopped => (None, false),
        };

        if keep_going && !raced.is_empty() && !cancel.is_cancelled() {
            info!(
                "Sequential phase found nothing for {}, racing {} providers",
                symbol,
                raced.len()
            );
            attempted.extend(raced.iter().map(|p| p.id()));
            let limits = RaceLimits {
                per_attempt: self.config.per_attempt_timeout,
                phase: self.config.phase_timeout,
            };
            winner = race_providers(raced, symbol, &cancel, limits, &self.health).await;
        }

        let result = match winner {
            Some((source, records)) => {
                info!(
                    "Retrieved {} dividend records for {} from '{}'",
                    records.len(),
                    symbol,
                    source
                );
                RetrievalResult::from_records(symbol.as_str(), records, source)
            }
            None => {
                info!("No dividend data found for {}", symbol);
                RetrievalResult::empty(symbol.as_str())
            }
        };
        result.with_sources_attempted(attempted)
    }

    /// Try providers one at a time, stopping at the first with data.
    ///
    /// An error whose retry class is `Never` ends the whole retrieval: no
    /// other provider would accept the input either.
    async fn sequential_phase(
        &self,
        symbol: &Symbol,
        providers: &[Arc<dyn DividendProvider>],
        race_follows: bool,
        cancel: &CancellationToken,
        attempted: &mut Vec<&'static str>,
    ) -> SequentialOutcome {
        for (index, provider) in providers.iter().enumerate() {
            if cancel.is_cancelled() {
                return SequentialOutcome::Stopped;
            }
            let id = provider.id();
            attempted.push(id);
            debug!("Trying provider '{}' for {}", id, symbol);

            let error = match provider.fetch_dividends(symbol, cancel).await {
                Ok(records) if !records.is_empty() => {
                    self.health.record_success(id);
                    return SequentialOutcome::Found(id, records);
                }
                Ok(_) => {
                    debug!("Provider '{}' has no dividends for {}", id, symbol);
                    continue;
                }
                Err(e) => e,
            };

            if let ProviderError::Cancelled { .. } = error {
                debug!("Provider '{}' cancelled for {}", id, symbol);
                return SequentialOutcome::Stopped;
            }

            if error.retry_class() == RetryClass::Never {
                warn!("Provider '{}' rejected {}: {}", id, symbol, error);
                return SequentialOutcome::Stopped;
            }

            warn!("Provider '{}' failed for {}: {}", id, symbol, error);
            self.health.record_failure(id, &error.to_string());

            let more_to_try = index + 1 < providers.len() || race_follows;
            if error.retry_class() == RetryClass::BackoffThenNext && more_to_try {
                let backoff = self.config.sequential_retry_backoff;
                debug!("Backing off {:?} after '{}' rate limit", backoff, id);
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = cancel.cancelled() => return SequentialOutcome::Stopped,
                }
            }
        }
        SequentialOutcome::Exhausted
    }

    /// Retrieve several symbols concurrently.
    ///
    /// The output maps every distinct input string to its result. A symbol
    /// that fails (invalid, or an internal failure) maps to an empty result
    /// without affecting the others.
    ///
    /// # Errors
    ///
    /// `InvalidSourceList` for unknown sources and `InvalidSymbol` when the
    /// batch holds more than `max_batch_symbols` distinct symbols.
    pub async fn get_batch(
        &self,
        symbols: &[String],
        sources: Option<&[String]>,
    ) -> Result<BTreeMap<String, RetrievalResult>, RetrievalError> {
        let mut seen = HashSet::new();
        let inputs: Vec<String> = symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        if inputs.is_empty() {
            return Ok(BTreeMap::new());
        }
        if inputs.len() > self.config.max_batch_symbols {
            return Err(RetrievalError::InvalidSymbol {
                symbol: format!("{} symbols", inputs.len()),
                message: format!(
                    "Too many symbols: {} (maximum {})",
                    inputs.len(),
                    self.config.max_batch_symbols
                ),
            });
        }
        self.registry.resolve(sources)?;

        info!("Batch retrieval of {} symbols", inputs.len());
        let sources: Option<Vec<String>> = sources.map(<[String]>::to_vec);

        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let service = self.clone();
                let input = input.clone();
                let sources = sources.clone();
                tokio::spawn(async move { service.get(&input, sources.as_deref(), true).await })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let results = inputs
            .into_iter()
            .zip(outcomes)
            .map(|(input, outcome)| {
                let result = match outcome {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        warn!("Batch entry '{}' failed: {}", input, e);
                        RetrievalResult::empty(input.as_str())
                    }
                    Err(join_error) => {
                        let internal = RetrievalError::Internal {
                            message: format!("batch task for '{}' failed: {}", input, join_error),
                            sources_attempted: Vec::new(),
                        };
                        error!("{}", internal);
                        RetrievalResult::empty(input.as_str())
                    }
                };
                (input, result)
            })
            .collect();

        Ok(results)
    }

    /// Snapshot of cache, provider health and configuration.
    pub fn stats(&self) -> ServiceStats {
        let mut available = self.registry.names();
        available.sort();

        ServiceStats {
            cache: self.cache.as_ref().map(|cache| cache.stats()),
            providers: self.health.snapshot(),
            config: ConfigSummary {
                cache_enabled: self.cache.is_some(),
                cache_ttl_seconds: self.config.cache_ttl.as_secs(),
                available_providers: available,
                default_priority: self.registry.default_priority(),
                max_concurrent_fallback: self.config.max_concurrent_fallback,
                per_attempt_timeout_seconds: self.config.per_attempt_timeout.as_secs(),
                phase_timeout_seconds: self.config.phase_timeout.as_secs(),
                sequential_retry_backoff_seconds: self.config.sequential_retry_backoff.as_secs(),
            },
        }
    }

    /// Drop every cached result. Returns how many were removed.
    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.as_ref().map_or(0, |cache| cache.clear_all());
        info!("Cleared {} cached results", removed);
        removed
    }

    /// Drop the cached results of one symbol, including source-qualified ones.
    pub fn invalidate(&self, symbol: &str) -> bool {
        let (Some(cache), Ok(canonical)) = (self.cache.as_ref(), Symbol::parse(symbol)) else {
            return false;
        };

        let mut removed = cache.invalidate(&canonical, None);
        for name in self.registry.names() {
            removed |= cache.invalidate(&canonical, Some(name.as_str()));
        }
        removed
    }

    /// Cancel in-flight retrievals and clear the cache.
    ///
    /// Later calls to `get` fail with `ProviderUnavailable`.
    pub fn shutdown(&self) {
        info!("Shutting down dividend service");
        self.shutdown.cancel();
        self.clear_cache();
    }
}

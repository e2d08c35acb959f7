//! Provider registry for the dividend retrieval service.
//!
//! The registry holds the fixed set of providers, handling:
//! - Default priority ordering
//! - Resolution of caller-supplied source lists
//! - The one-time `prepare` step of every provider

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::errors::RetrievalError;
use crate::provider::{DividendProvider, ProviderKind};

/// Named, priority-ordered collection of providers.
///
/// Built once and read-only thereafter.
pub struct ProviderRegistry {
    /// Providers in default priority order
    providers: Vec<Arc<dyn DividendProvider>>,
    ready: OnceCell<()>,
}

impl ProviderRegistry {
    /// Create a registry from arbitrary providers.
    ///
    /// Providers are ordered by their declared priority; equal priorities keep
    /// registration order. A provider whose id is already registered is
    /// dropped.
    pub fn new(providers: Vec<Arc<dyn DividendProvider>>) -> Self {
        let mut seen = HashSet::new();
        let mut providers: Vec<_> = providers
            .into_iter()
            .filter(|provider| {
                let fresh = seen.insert(provider.id());
                if !fresh {
                    warn!("Duplicate provider '{}' ignored", provider.id());
                }
                fresh
            })
            .collect();
        providers.sort_by_key(|provider| provider.priority());

        Self {
            providers,
            ready: OnceCell::new(),
        }
    }

    /// Create a registry with every built-in provider.
    pub fn builtin() -> Self {
        Self::new(ProviderKind::ALL.iter().map(|kind| kind.build()).collect())
    }

    /// Provider names in default priority order.
    pub fn default_priority(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.id().to_string())
            .collect()
    }

    /// Alias of [`default_priority`](Self::default_priority) for display.
    pub fn names(&self) -> Vec<String> {
        self.default_priority()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn DividendProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.id().eq_ignore_ascii_case(name))
    }

    /// Resolve a caller-supplied source list into providers.
    ///
    /// `None` or an empty list gives every provider in default priority.
    /// Otherwise names are matched case-insensitively after trimming,
    /// duplicates are dropped, and the caller's order is kept.
    pub fn resolve(
        &self,
        sources: Option<&[String]>,
    ) -> Result<Vec<Arc<dyn DividendProvider>>, RetrievalError> {
        let sources = match sources {
            Some(sources) if !sources.is_empty() => sources,
            _ => return Ok(self.providers.clone()),
        };

        let mut resolved: Vec<Arc<dyn DividendProvider>> = Vec::new();
        let mut unknown = Vec::new();

        for raw in sources {
            let name = raw.trim();
            match self.find(name) {
                Some(provider) => {
                    if !resolved.iter().any(|p| p.id() == provider.id()) {
                        resolved.push(provider.clone());
                    }
                }
                None => unknown.push(name.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(RetrievalError::InvalidSourceList {
                unknown,
                valid: self.default_priority(),
            });
        }

        debug!(
            "Resolved sources: {:?}",
            resolved.iter().map(|p| p.id()).collect::<Vec<_>>()
        );
        Ok(resolved)
    }

    /// Prepare every provider once.
    ///
    /// Safe under concurrent first access. Individual preparation failures are
    /// logged; readiness fails only when no provider could be prepared, and is
    /// then retried on the next call.
    pub async fn ensure_ready(&self) -> Result<(), RetrievalError> {
        self.ready
            .get_or_try_init(|| self.prepare_all())
            .await
            .map(|_| ())
    }

    async fn prepare_all(&self) -> Result<(), RetrievalError> {
        if self.providers.is_empty() {
            return Err(RetrievalError::ProviderUnavailable {
                message: "No providers configured".to_string(),
                sources_attempted: Vec::new(),
            });
        }

        let outcomes = join_all(self.providers.iter().map(|provider| async move {
            (provider.id(), provider.prepare().await)
        }))
        .await;

        let mut ready = 0;
        for (id, outcome) in &outcomes {
            match outcome {
                Ok(()) => ready += 1,
                Err(e) => warn!("Provider '{}' failed to prepare: {}", id, e),
            }
        }

        if ready == 0 {
            return Err(RetrievalError::ProviderUnavailable {
                message: "No provider could be prepared".to_string(),
                sources_attempted: Vec::new(),
            });
        }

        info!("{} of {} providers ready", ready, outcomes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    use crate::errors::ProviderError;
    use crate::models::{DividendRecord, Symbol};
    use crate::provider::RateLimit;

    struct MockProvider {
        id: &'static str,
        priority: u8,
        fail_prepare: bool,
        prepare_calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, priority: u8) -> Self {
            Self {
                id,
                priority,
                fail_prepare: false,
                prepare_calls: AtomicUsize::new(0),
            }
        }

        fn failing(id: &'static str) -> Self {
            Self {
                fail_prepare: true,
                ..Self::new(id, 10)
            }
        }
    }

    #[async_trait]
    impl DividendProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit::default()
        }

        async fn prepare(&self) -> Result<(), ProviderError> {
            self.prepare_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_prepare {
                Err(ProviderError::transport(self.id, "no client"))
            } else {
                Ok(())
            }
        }

        async fn fetch_dividends(
            &self,
            _symbol: &Symbol,
            _cancel: &CancellationToken,
        ) -> Result<Vec<DividendRecord>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn sources(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ids(providers: &[Arc<dyn DividendProvider>]) -> Vec<&'static str> {
        providers.iter().map(|p| p.id()).collect()
    }

    #[test]
    fn test_builtin_priority() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.default_priority(), vec!["yahoo", "marketwatch"]);
    }

    #[test]
    fn test_providers_sorted_by_priority() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::new("slow", 5)),
            Arc::new(MockProvider::new("fast", 1)),
            Arc::new(MockProvider::new("also_slow", 5)),
        ]);
        assert_eq!(
            registry.default_priority(),
            vec!["fast", "slow", "also_slow"]
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(
            ids(&registry.resolve(None).unwrap()),
            vec!["yahoo", "marketwatch"]
        );
        assert_eq!(
            ids(&registry.resolve(Some(&[][..])).unwrap()),
            vec!["yahoo", "marketwatch"]
        );
    }

    #[test]
    fn test_resolve_keeps_caller_order_and_dedups() {
        let registry = ProviderRegistry::builtin();
        let resolved = registry
            .resolve(Some(sources(&[" MarketWatch", "yahoo", "marketwatch"]).as_slice()))
            .unwrap();
        assert_eq!(ids(&resolved), vec!["marketwatch", "yahoo"]);
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let registry = ProviderRegistry::builtin();
        let err = registry
            .resolve(Some(sources(&["yahoo", "google"]).as_slice()))
            .err()
            .unwrap();

        match err {
            RetrievalError::InvalidSourceList { unknown, valid } => {
                assert_eq!(unknown, vec!["google"]);
                assert_eq!(valid, vec!["yahoo", "marketwatch"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_ready_runs_once() {
        let provider = Arc::new(MockProvider::new("a", 1));
        let registry = ProviderRegistry::new(vec![provider.clone()]);

        let (first, second) = tokio::join!(registry.ensure_ready(), registry.ensure_ready());
        assert!(first.is_ok() && second.is_ok());
        registry.ensure_ready().await.unwrap();

        assert_eq!(provider.prepare_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_ready_tolerates_partial_failure() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::failing("broken")),
            Arc::new(MockProvider::new("fine", 1)),
        ]);
        assert!(registry.ensure_ready().await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_ready_fails_and_retries_when_all_fail() {
        let provider = Arc::new(MockProvider::failing("broken"));
        let registry = ProviderRegistry::new(vec![provider.clone()]);

        let err = registry.ensure_ready().await.unwrap_err();
        assert!(matches!(err, RetrievalError::ProviderUnavailable { .. }));

        assert!(registry.ensure_ready().await.is_err());
        assert_eq!(provider.prepare_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_registry_is_unavailable() {
        let registry = ProviderRegistry::new(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.ensure_ready().await.is_err());
    }
}

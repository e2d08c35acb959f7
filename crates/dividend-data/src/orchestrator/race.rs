//! Concurrent fallback phase.
//!
//! Launches every remaining provider at once and keeps the first attempt that
//! returns at least one record. Each attempt runs under its own timeout, the
//! whole phase under another. Once a winner is known, or the phase times out,
//! the remaining attempts are cancelled and aborted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::errors::{ProviderError, RetrievalError, RetryClass};
use crate::models::{DividendRecord, Symbol};
use crate::provider::DividendProvider;
use crate::registry::HealthTracker;

/// Timeouts governing one race.
#[derive(Clone, Copy, Debug)]
pub struct RaceLimits {
    pub per_attempt: Duration,
    pub phase: Duration,
}

type AttemptOutcome = (
    &'static str,
    Result<Result<Vec<DividendRecord>, ProviderError>, tokio::time::error::Elapsed>,
);

/// Race `providers` for `symbol`.
///
/// Returns the winning provider and its records, or `None` when every attempt
/// failed, returned nothing, or the phase timed out. Failed and timed-out
/// attempts are recorded in `health`; attempts cancelled because another
/// provider won are not.
pub async fn race_providers(
    providers: Vec<Arc<dyn DividendProvider>>,
    symbol: &Symbol,
    parent: &CancellationToken,
    limits: RaceLimits,
    health: &HealthTracker,
) -> Option<(&'static str, Vec<DividendRecord>)> {
    if providers.is_empty() {
        return None;
    }

    let cancel = parent.child_token();
    let mut pending: HashSet<&'static str> = providers.iter().map(|p| p.id()).collect();
    let mut attempts: JoinSet<AttemptOutcome> = JoinSet::new();

    for provider in providers {
        let symbol = symbol.clone();
        let token = cancel.clone();
        attempts.spawn(async move {
            let outcome = tokio::time::timeout(
                limits.per_attempt,
                provider.fetch_dividends(&symbol, &token),
            )
            .await;
            (provider.id(), outcome)
        });
    }
    debug!("Racing {} providers for {}", pending.len(), symbol);

    let drain = async {
        while let Some(joined) = attempts.join_next().await {
            let (id, outcome) = match joined {
                Ok(done) => done,
                Err(join_error) => {
                    let internal = RetrievalError::Internal {
                        message: format!("race attempt for {} failed to join: {}", symbol, join_error),
                        sources_attempted: Vec::new(),
                    };
                    error!("{}", internal);
                    continue;
                }
            };
            pending.remove(id);

            match outcome {
                Ok(Ok(records)) if !records.is_empty() => {
                    health.record_success(id);
                    return Some((id, records));
                }
                Ok(Ok(_)) => debug!("Provider '{}' has no dividends for {}", id, symbol),
                Ok(Err(ProviderError::Cancelled { .. })) => {
                    debug!("Provider '{}' cancelled for {}", id, symbol)
                }
                Ok(Err(e)) if e.retry_class() == RetryClass::Never => {
                    warn!("Provider '{}' rejected {}: {}", id, symbol, e)
                }
                Ok(Err(e)) => {
                    warn!("Provider '{}' failed for {}: {}", id, symbol, e);
                    health.record_failure(id, &e.to_string());
                }
                Err(_) => {
                    warn!(
                        "Provider '{}' timed out after {:?} for {}",
                        id, limits.per_attempt, symbol
                    );
                    health.record_failure(
                        id,
                        &format!("timed out after {}s", limits.per_attempt.as_secs_f64()),
                    );
                }
            }
        }
        None
    };

    let raced = tokio::time::timeout(limits.phase, drain).await;
    let winner = match raced {
        Ok(winner) => winner,
        Err(_) => {
            warn!(
                "Concurrent phase for {} timed out after {:?}",
                symbol, limits.phase
            );
            for id in &pending {
                health.record_failure(
                    id,
                    &format!("phase timed out after {}s", limits.phase.as_secs_f64()),
                );
            }
            None
        }
    };

    cancel.cancel();
    attempts.abort_all();

    if let Some((id, records)) = &winner {
        info!(
            "Provider '{}' won the race for {} with {} records",
            id,
            symbol,
            records.len()
        );
    }
    winner
}

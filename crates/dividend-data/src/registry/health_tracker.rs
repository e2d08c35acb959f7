//! Per-provider health statistics.
//!
//! Counts successes and failures of every provider attempt made by the
//! service, with the time and message of the latest outcome. The tracker is
//! in-memory and resets when the process restarts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;

/// Running counters for a single provider.
#[derive(Clone, Debug, Default)]
struct ProviderHealth {
    success_count: u64,
    error_count: u64,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<DateTime<Utc>>,
    last_error_message: Option<String>,
}

/// Point-in-time view of one provider's health.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderHealthSnapshot {
    pub success_count: u64,
    pub error_count: u64,
    pub total_requests: u64,
    /// Share of successful attempts in percent, two decimals
    pub success_rate_percent: f64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}

impl From<&ProviderHealth> for ProviderHealthSnapshot {
    fn from(health: &ProviderHealth) -> Self {
        let total = health.success_count + health.error_count;
        let rate = if total == 0 {
            0.0
        } else {
            health.success_count as f64 / total as f64 * 100.0
        };
        Self {
            success_count: health.success_count,
            error_count: health.error_count,
            total_requests: total,
            success_rate_percent: (rate * 100.0).round() / 100.0,
            last_success: health.last_success,
            last_error: health.last_error,
            last_error_message: health.last_error_message.clone(),
        }
    }
}

/// Thread-safe health tracker for a fixed set of providers.
pub struct HealthTracker {
    providers: Mutex<HashMap<String, ProviderHealth>>,
}

impl HealthTracker {
    /// Create a tracker for the given provider names.
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let providers = providers
            .into_iter()
            .map(|name| (name.into(), ProviderHealth::default()))
            .collect();
        Self {
            providers: Mutex::new(providers),
        }
    }

    /// Lock the providers mutex, recovering from poison if necessary.
    fn lock_providers(&self) -> MutexGuard<'_, HashMap<String, ProviderHealth>> {
        self.providers.lock().unwrap_or_else(|poisoned| {
            warn!("Health tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record the outcome of one provider attempt.
    ///
    /// Unknown provider names are ignored.
    pub fn record(&self, provider: &str, success: bool, error: Option<&str>) {
        let mut providers = self.lock_providers();
        let Some(health) = providers.get_mut(provider) else {
            debug!("Health: ignoring outcome for unknown provider '{}'", provider);
            return;
        };

        let now = Utc::now();
        if success {
            health.success_count += 1;
            health.last_success = Some(now);
        } else {
            health.error_count += 1;
            health.last_error = Some(now);
            health.last_error_message = error.map(str::to_string);
            debug!(
                "Health: failure #{} for '{}': {}",
                health.error_count,
                provider,
                error.unwrap_or("unknown error")
            );
        }
    }

    pub fn record_success(&self, provider: &str) {
        self.record(provider, true, None);
    }

    pub fn record_failure(&self, provider: &str, error: &str) {
        self.record(provider, false, Some(error));
    }

    /// Snapshot every tracked provider, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, ProviderHealthSnapshot> {
        self.lock_providers()
            .iter()
            .map(|(name, health)| (name.clone(), ProviderHealthSnapshot::from(health)))
            .collect()
    }
}

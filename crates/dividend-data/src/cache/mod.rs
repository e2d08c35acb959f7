//! Bounded, time-expiring cache of retrieval results.
//!
//! Entries are keyed by symbol (and by source for single-source lookups) and
//! expire after a TTL fixed at write time. When the cache is full, expired
//! entries are purged first; if it is still full, the least recently *set*
//! entry is evicted. Reads never change eviction order.
//!
//! Expiry is measured on the tokio clock so it follows a paused test clock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use tokio::time::Instant;

use crate::models::{RetrievalResult, Symbol};

/// Default time-to-live for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached results.
pub const DEFAULT_MAX_SIZE: usize = 1000;

const KEY_PREFIX: &str = "dividend";

/// Cache key for a symbol, optionally qualified by the single requested source.
pub fn cache_key(symbol: &Symbol, source: Option<&str>) -> String {
    match source {
        Some(source) => format!(
            "{}:{}:{}",
            KEY_PREFIX,
            symbol,
            source.trim().to_ascii_lowercase()
        ),
        None => format!("{}:{}", KEY_PREFIX, symbol),
    }
}

/// Cache occupancy and effectiveness counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: u64,
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry {
    result: RetrievalResult,
    expires_at: Instant,
    /// Wall-clock expiry reported to callers on a hit
    expires_at_utc: DateTime<Utc>,
    /// Write sequence number, the eviction order
    seq: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Write sequence → key, oldest first
    write_order: BTreeMap<u64, String>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.write_order.remove(&entry.seq);
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.write_order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// In-memory result cache shared by all retrievals of a service.
pub struct DividendCache {
    state: Mutex<CacheState>,
    max_size: usize,
    default_ttl: Duration,
}

impl DividendCache {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_size,
            default_ttl,
        }
    }

    /// Lock the cache state, recovering from poison if necessary.
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Dividend cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Look up a cached result.
    ///
    /// A hit is a copy with `cached = true` and `cache_expires_at` set to the
    /// expiry fixed when the entry was stored. Expired entries are removed.
    pub fn get(&self, symbol: &Symbol, source: Option<&str>) -> Option<RetrievalResult> {
        let key = cache_key(symbol, source);
        let now = Instant::now();
        let mut state = self.lock_state();

        let expired = match state.entries.get(&key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.expires_at <= now,
        };

        if expired {
            state.remove(&key);
            state.misses += 1;
            debug!("Cache entry expired: {}", key);
            return None;
        }

        state.hits += 1;
        let entry = state.entries.get(&key)?;
        let mut result = entry.result.clone();
        result.cached = true;
        result.cache_expires_at = Some(entry.expires_at_utc);
        Some(result)
    }

    /// Store a result, overwriting any previous entry for the key.
    ///
    /// `ttl` defaults to the cache's default TTL. A zero TTL stores nothing
    /// and returns `false`.
    pub fn set(
        &self,
        symbol: &Symbol,
        result: &RetrievalResult,
        source: Option<&str>,
        ttl: Option<Duration>,
    ) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.is_zero() || self.max_size == 0 {
            return false;
        }
        let now = Instant::now();
        let expiry = chrono::Duration::from_std(ttl).ok().and_then(|wall_ttl| {
            let expires_at = now.checked_add(ttl)?;
            let expires_at_utc = Utc::now().checked_add_signed(wall_ttl)?;
            Some((expires_at, expires_at_utc))
        });
        let Some((expires_at, expires_at_utc)) = expiry else {
            warn!("Refusing to cache {} with out-of-range TTL {:?}", symbol, ttl);
            return false;
        };

        let key = cache_key(symbol, source);
        let mut state = self.lock_state();

        if state.remove(&key).is_none() && state.entries.len() >= self.max_size {
            let purged = state.purge_expired(now);
            if purged > 0 {
                debug!("Cache purged {} expired entries", purged);
            }
            if state.entries.len() >= self.max_size {
                if let Some(evicted) = state.evict_oldest() {
                    debug!("Cache full, evicted {}", evicted);
                }
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;

        let mut stored = result.clone();
        stored.cached = false;
        stored.cache_expires_at = None;

        state.write_order.insert(seq, key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                result: stored,
                expires_at,
                expires_at_utc,
                seq,
            },
        );
        true
    }

    /// Remove the entry for a symbol. Returns whether one existed.
    pub fn invalidate(&self, symbol: &Symbol, source: Option<&str>) -> bool {
        let key = cache_key(symbol, source);
        self.lock_state().remove(&key).is_some()
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut state = self.lock_state();
        let removed = state.entries.len();
        state.entries.clear();
        state.write_order.clear();
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock_state();
        CacheStats {
            size: state.entries.len(),
            max_size: self.max_size,
            ttl_seconds: self.default_ttl.as_secs(),
            hits: state.hits,
            misses: state.misses,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for DividendCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}

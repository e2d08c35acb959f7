//! Service configuration.
//!
//! Every setting has a default and can be overridden through a
//! `DIVIDEND_`-prefixed environment variable. Values that fail to parse fall
//! back to the default with a warning.

use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL};

pub const ENV_USE_CACHE: &str = "DIVIDEND_USE_CACHE";
pub const ENV_CACHE_TTL_SECONDS: &str = "DIVIDEND_CACHE_TTL_SECONDS";
pub const ENV_CACHE_MAX_SIZE: &str = "DIVIDEND_CACHE_MAX_SIZE";
pub const ENV_MAX_CONCURRENT_FALLBACK: &str = "DIVIDEND_MAX_CONCURRENT_FALLBACK";
pub const ENV_PER_ATTEMPT_TIMEOUT_SECONDS: &str = "DIVIDEND_PER_ATTEMPT_TIMEOUT_SECONDS";
pub const ENV_PHASE_TIMEOUT_SECONDS: &str = "DIVIDEND_PHASE_TIMEOUT_SECONDS";
pub const ENV_RATE_LIMIT_BACKOFF_SECONDS: &str = "DIVIDEND_RATE_LIMIT_BACKOFF_SECONDS";
pub const ENV_MAX_SEQUENTIAL_ATTEMPTS: &str = "DIVIDEND_MAX_SEQUENTIAL_ATTEMPTS";
pub const ENV_MAX_BATCH_SYMBOLS: &str = "DIVIDEND_MAX_BATCH_SYMBOLS";

/// Tunables of the retrieval service.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    /// Whether results are cached at all
    pub use_cache: bool,
    pub cache_ttl: Duration,
    pub cache_max_size: usize,
    /// Upper bound on providers raced in the concurrent phase
    pub max_concurrent_fallback: usize,
    pub per_attempt_timeout: Duration,
    pub phase_timeout: Duration,
    /// Pause after a rate-limited provider before trying the next one
    pub sequential_retry_backoff: Duration,
    /// Providers tried one by one before racing the rest; `None` tries all
    pub max_sequential_attempts: Option<usize>,
    pub max_batch_symbols: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_ttl: DEFAULT_TTL,
            cache_max_size: DEFAULT_MAX_SIZE,
            max_concurrent_fallback: 2,
            per_attempt_timeout: Duration::from_secs(15),
            phase_timeout: Duration::from_secs(30),
            sequential_retry_backoff: Duration::from_secs(2),
            max_sequential_attempts: None,
            max_batch_symbols: 50,
        }
    }
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let seconds = |name: &str, default: Duration| {
            Duration::from_secs(parse_or(&lookup, name, default.as_secs()))
        };

        let max_sequential_attempts = match lookup(ENV_MAX_SEQUENTIAL_ATTEMPTS) {
            None => defaults.max_sequential_attempts,
            Some(raw) if raw.trim().is_empty() || raw.trim().eq_ignore_ascii_case("unlimited") => {
                None
            }
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) => Some(limit),
                Err(_) => {
                    warn!(
                        "Invalid {}='{}', using default",
                        ENV_MAX_SEQUENTIAL_ATTEMPTS, raw
                    );
                    defaults.max_sequential_attempts
                }
            },
        };

        Self {
            use_cache: parse_bool_or(&lookup, ENV_USE_CACHE, defaults.use_cache),
            cache_ttl: seconds(ENV_CACHE_TTL_SECONDS, defaults.cache_ttl),
            cache_max_size: parse_or(&lookup, ENV_CACHE_MAX_SIZE, defaults.cache_max_size),
            max_concurrent_fallback: parse_or(
                &lookup,
                ENV_MAX_CONCURRENT_FALLBACK,
                defaults.max_concurrent_fallback,
            ),
            per_attempt_timeout: seconds(
                ENV_PER_ATTEMPT_TIMEOUT_SECONDS,
                defaults.per_attempt_timeout,
            ),
            phase_timeout: seconds(ENV_PHASE_TIMEOUT_SECONDS, defaults.phase_timeout),
            sequential_retry_backoff: seconds(
                ENV_RATE_LIMIT_BACKOFF_SECONDS,
                defaults.sequential_retry_backoff,
            ),
            max_sequential_attempts,
            max_batch_symbols: parse_or(&lookup, ENV_MAX_BATCH_SYMBOLS, defaults.max_batch_symbols),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}='{}', using default", name, raw);
            default
        }),
    }
}

fn parse_bool_or<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!("Invalid {}='{}', using default", name, raw);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert!(config.use_cache);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.cache_max_size, 1000);
        assert_eq!(config.max_concurrent_fallback, 2);
        assert_eq!(config.per_attempt_timeout, Duration::from_secs(15));
        assert_eq!(config.phase_timeout, Duration::from_secs(30));
        assert_eq!(config.sequential_retry_backoff, Duration::from_secs(2));
        assert_eq!(config.max_sequential_attempts, None);
        assert_eq!(config.max_batch_symbols, 50);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), ServiceConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (ENV_USE_CACHE, "false"),
            (ENV_CACHE_TTL_SECONDS, "60"),
            (ENV_CACHE_MAX_SIZE, " 10 "),
            (ENV_MAX_SEQUENTIAL_ATTEMPTS, "1"),
            (ENV_RATE_LIMIT_BACKOFF_SECONDS, "0"),
        ]);
        assert!(!config.use_cache);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cache_max_size, 10);
        assert_eq!(config.max_sequential_attempts, Some(1));
        assert_eq!(config.sequential_retry_backoff, Duration::ZERO);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            (ENV_USE_CACHE, "maybe"),
            (ENV_CACHE_TTL_SECONDS, "-5"),
            (ENV_MAX_SEQUENTIAL_ATTEMPTS, "lots"),
        ]);
        assert!(config.use_cache);
        assert_eq!(config.cache_ttl, DEFAULT_TTL);
        assert_eq!(config.max_sequential_attempts, None);
    }

    #[test]
    fn test_unlimited_sequential_attempts() {
        let config = config_from(&[(ENV_MAX_SEQUENTIAL_ATTEMPTS, "unlimited")]);
        assert_eq!(config.max_sequential_attempts, None);
    }
}

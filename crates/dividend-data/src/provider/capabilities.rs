//! Provider rate limiting configuration.
//!
//! Describes how gently a dividend provider must be called to avoid
//! getting throttled or blocked by the remote site.

use std::time::Duration;

/// Default HTTP request timeout applied by providers.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiting configuration for a provider.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Minimum delay between two successive requests of the same provider.
    pub min_delay: Duration,

    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

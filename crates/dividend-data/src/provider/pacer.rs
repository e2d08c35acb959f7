//! Per-provider request pacing.
//!
//! Each provider owns one pacer. Before issuing a request the provider waits
//! its turn: the pacer suspends the caller until at least `min_delay` has
//! elapsed since the previous request of the same provider. Different
//! providers never share a pacer, so they never block each other.

use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

/// Minimum-spacing gate for one provider's outbound requests.
pub struct RequestPacer {
    provider: &'static str,
    min_delay: Duration,
    /// Time the last request was let through. Held across the wait so
    /// concurrent callers of the same provider queue up behind each other.
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(provider: &'static str, min_delay: Duration) -> Self {
        Self {
            provider,
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Wait until this provider may issue its next request.
    ///
    /// Returns [`ProviderError::Cancelled`] if the token fires while queued or
    /// sleeping; in that case the slot is not consumed.
    pub async fn wait_turn(&self, cancel: &CancellationToken) -> Result<(), ProviderError> {
        if cancel.is_cancelled() {
            return Err(self.cancelled());
        }

        let mut last = tokio::select! {
            guard = self.last_request.lock() => guard,
            _ = cancel.cancelled() => return Err(self.cancelled()),
        };

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                let wait = self.min_delay - elapsed;
                debug!("Pacer: waiting {:?} for provider '{}'", wait, self.provider);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = cancel.cancelled() => return Err(self.cancelled()),
                }
            }
        }

        *last = Some(Instant::now());
        Ok(())
    }

    /// Time of the last request let through, if any.
    pub async fn last_request(&self) -> Option<Instant> {
        *self.last_request.lock().await
    }

    fn cancelled(&self) -> ProviderError {
        ProviderError::Cancelled {
            provider: self.provider.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let pacer = RequestPacer::new("test", Duration::from_secs(1));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        pacer.wait_turn(&cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(pacer.last_request().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successive_requests_are_spaced() {
        let pacer = RequestPacer::new("test", Duration::from_millis(1500));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        pacer.wait_turn(&cancel).await.unwrap();
        pacer.wait_turn(&cancel).await.unwrap();
        pacer.wait_turn(&cancel).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_delay_has_passed() {
        let pacer = RequestPacer::new("test", Duration::from_secs(1));
        let cancel = CancellationToken::new();

        pacer.wait_turn(&cancel).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        pacer.wait_turn(&cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let pacer = Arc::new(RequestPacer::new("test", Duration::from_secs(60)));
        let cancel = CancellationToken::new();
        pacer.wait_turn(&cancel).await.unwrap();

        let waiter = {
            let pacer = pacer.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { pacer.wait_turn(&cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ProviderError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_fails_fast() {
        let pacer = RequestPacer::new("test", Duration::from_secs(1));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(pacer.wait_turn(&cancel).await.is_err());
        assert!(pacer.last_request().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacers_are_independent() {
        let a = RequestPacer::new("a", Duration::from_secs(5));
        let b = RequestPacer::new("b", Duration::from_secs(5));
        let cancel = CancellationToken::new();

        a.wait_turn(&cancel).await.unwrap();

        let start = Instant::now();
        b.wait_turn(&cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

/// Classification for fallback policy.
///
/// Used by the orchestrator to decide what to do after a provider attempt fails.
///
/// # Behavior Summary
///
/// | Class | Try Next Provider? | Wait First? | Record Health Failure? |
/// |-------|-------------------|-------------|------------------------|
/// | `Never` | No | No | No |
/// | `BackoffThenNext` | Yes | Yes | Yes |
/// | `NextProvider` | Yes | No | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol or the attempt was cancelled.
    /// Moving to another provider won't help.
    Never,

    /// The remote side asked us to back off (HTTP 429).
    ///
    /// The orchestrator waits the configured backoff before moving on to the
    /// next provider, so the next request doesn't land on an already
    /// throttled network path.
    BackoffThenNext,

    /// Move on to the next provider immediately.
    ///
    /// Used for transport failures: network errors, timeouts, unexpected
    /// HTTP status codes and unparseable payloads.
    NextProvider,
}

//! Retry delay for failed statistics queries.

use std::time::Duration;

/// HTTP status the service uses to signal rate limiting.
pub const RATE_LIMITED: u16 = 429;

/// Wait imposed by the service after a rate-limited request.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(60);

/// Upper bound of the exponential backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retrying after failed attempt number `attempt` (1-based).
///
/// A rate-limited response always waits [`RATE_LIMIT_DELAY`]. Any other
/// failure backs off exponentially: one second after the first attempt,
/// then `2^attempt` seconds, capped at [`MAX_BACKOFF`].
pub fn compute_retry_delay(attempt: u32, status: Option<u16>) -> Duration {
    if status == Some(RATE_LIMITED) {
        return RATE_LIMIT_DELAY;
    }
    let millis = if attempt > 1 {
        2u64.checked_pow(attempt)
            .map_or(u64::MAX, |p| p.saturating_mul(1000))
    } else {
        1000
    };
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

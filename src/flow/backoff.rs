use std::time::Duration;

/// Pause before the next pull after `attempt` consecutive empty pulls.
///
/// Exponential backoff starting at 100ms, capped at `cap`.
pub fn idle_backoff(attempt: u32, cap: Duration) -> Duration {
    let base_ms: u64 = 100;
    let exp = attempt.min(16);
    let factor = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
    let delay = Duration::from_millis(base_ms.saturating_mul(factor));
    delay.min(cap)
}

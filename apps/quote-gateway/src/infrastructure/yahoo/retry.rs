//! Chart fetch retry policy.
//!
//! An explicit bounded policy with an injectable backoff function, so the
//! retry schedule is unit-testable in isolation from timing and the loop
//! driving it keeps stack depth constant.

use std::time::Duration;

/// Bounded retry schedule for chart fetches.
pub struct ChartRetryPolicy {
    attempts: u32,
    backoff: Box<dyn Fn(u32) -> Duration + Send + Sync>,
}

impl ChartRetryPolicy {
    /// Policy with linearly increasing delays: after failed attempt `n`
    /// (1-based), wait `n * base`.
    #[must_use]
    pub fn linear(attempts: u32, base: Duration) -> Self {
        Self::with_backoff(attempts, move |attempt| base * attempt)
    }

    /// Policy with a custom backoff function of the failed attempt index.
    #[must_use]
    pub fn with_backoff<F>(attempts: u32, backoff: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            attempts: attempts.max(1),
            backoff: Box::new(backoff),
        }
    }

    /// Total attempts allowed, always at least one.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }
}

impl std::fmt::Debug for ChartRetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartRetryPolicy")
            .field("attempts", &self.attempts)
            .finish()
    }
}

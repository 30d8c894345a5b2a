//! Outbound request pacing.
//!
//! Upstream throttles aggressively, so the provider keeps at most one
//! request in flight and spaces dispatches by a minimum interval. This is
//! a provider-level policy, not per-call.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Serializes outbound requests with minimum spacing.
#[derive(Debug)]
pub struct RateGate {
    min_spacing: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

/// Permission to dispatch one request. Holding the permit keeps the gate
/// closed, so requests cannot overlap.
#[derive(Debug)]
pub struct RatePermit<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl RateGate {
    /// Create a gate with the given minimum dispatch spacing.
    #[must_use]
    pub const fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_dispatch: Mutex::const_new(None),
        }
    }

    /// Wait until a request may be dispatched.
    ///
    /// Callers hold the returned permit for the duration of the request.
    pub async fn acquire(&self) -> RatePermit<'_> {
        let mut last = self.last_dispatch.lock().await;

        if let Some(prev) = *last {
            let due = prev + self.min_spacing;
            if due > Instant::now() {
                tokio::time::sleep_until(due).await;
            }
        }

        *last = Some(Instant::now());
        RatePermit { _guard: last }
    }
}

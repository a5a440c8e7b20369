//! Quota-driven rate limiting
//!
//! This module handles:
//! - Tracking the last quota signal seen for each endpoint class
//! - Deciding whether a signal calls for a stall, and for how long
//! - Suspending the calling stage until the quota window resets
//!
//! Each endpoint class is accounted separately: a stall computed from a search
//! signal never delays the followers or posts classes.

use crate::state::{ClassState, EndpointClass, RateSignal};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Remaining-request count at or below which the limiter turns cautious
pub const LOW_QUOTA_THRESHOLD: u64 = 5;

/// How close to the window reset a low quota triggers a precautionary stall
pub const RESET_EDGE_WINDOW: Duration = Duration::from_secs(30);

/// Per-endpoint-class throttle state
///
/// Owned by the orchestrator; there is one instance per run and no shared
/// global state.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    search: ClassState,
    followers: ClassState,
    posts: ClassState,
}

impl RateLimiter {
    /// Creates a limiter with every class in `NeverCalled`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for one endpoint class
    pub fn state(&self, class: EndpointClass) -> &ClassState {
        match class {
            EndpointClass::Search => &self.search,
            EndpointClass::Followers => &self.followers,
            EndpointClass::Posts => &self.posts,
        }
    }

    fn state_mut(&mut self, class: EndpointClass) -> &mut ClassState {
        match class {
            EndpointClass::Search => &mut self.search,
            EndpointClass::Followers => &mut self.followers,
            EndpointClass::Posts => &mut self.posts,
        }
    }

    /// Records the signal from the latest call and returns the previous state
    pub fn observe(&mut self, class: EndpointClass, signal: Option<RateSignal>) -> ClassState {
        std::mem::replace(self.state_mut(class), ClassState::observed(signal))
    }

    /// Records the latest signal for `class`, then throttles on the one before it
    ///
    /// The first call of a class finds `NeverCalled` and does not wait.
    ///
    /// # Returns
    ///
    /// The time spent suspended, if the limiter stalled
    pub async fn advance(
        &mut self,
        class: EndpointClass,
        signal: Option<RateSignal>,
    ) -> Option<Duration> {
        let previous = self.observe(class, signal);
        Self::throttle(class, previous.signal()).await
    }

    /// Suspends the caller if `signal` says the quota is exhausted or nearly so
    ///
    /// # Returns
    ///
    /// The time spent suspended, or None if the call returned immediately
    pub async fn throttle(class: EndpointClass, signal: Option<&RateSignal>) -> Option<Duration> {
        let wait = Self::suspension(signal, Utc::now())?;

        tracing::info!(
            class = %class,
            remaining = ?signal.map(|s| s.requests_remaining),
            "Rate limit stall: waiting {:.1}s for the {} quota to reset",
            wait.as_secs_f64(),
            class
        );
        tokio::time::sleep(wait).await;

        Some(wait)
    }

    /// Decides how long to stall for `signal` at time `now`
    ///
    /// | Condition | Stall |
    /// |-----------|-------|
    /// | no signal | none |
    /// | reset already passed | none |
    /// | 0 requests remaining | until reset |
    /// | ≤ 5 remaining and reset < 30s away | until reset |
    /// | otherwise | none |
    pub fn suspension(signal: Option<&RateSignal>, now: DateTime<Utc>) -> Option<Duration> {
        let signal = signal?;

        // Negative means the window already rolled over
        let remaining = (signal.reset_at - now).to_std().ok()?;

        let stall = if signal.requests_remaining == 0 {
            true
        } else {
            signal.requests_remaining <= LOW_QUOTA_THRESHOLD && remaining < RESET_EDGE_WINDOW
        };

        if stall && !remaining.is_zero() {
            Some(remaining)
        } else {
            None
        }
    }
}

//! Pacing of speech-synthesis requests.
//!
//! The synthesis service rate-limits aggressively; requests must be spaced
//! by a minimum interval. A token bucket models this instead of a bare
//! sleep so the interval is configurable and tests can disable it.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::time::Duration;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum interval between synthesis calls.
pub struct SynthesisPacer {
    limiter: Option<DirectRateLimiter>,
}

impl SynthesisPacer {
    /// A pacer allowing one request per `min_interval`. A zero interval
    /// disables pacing entirely.
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(RateLimiter::direct);
        Self { limiter }
    }

    /// Wait until the next request is allowed.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

//! Run-wide request pacing.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request pacer shared by every archive task in a run.
///
/// The bulk-data host throttles by request volume, not by connection, so one
/// budget must cover all concurrent workers. Requests are spread evenly
/// across the window rather than burned in a burst at its start.
pub struct RequestPacer {
    limiter: DirectRateLimiter,
    requests_per_window: u32,
    window: Duration,
}

impl RequestPacer {
    /// Allow `requests_per_window` requests per `window`. A zero limit is
    /// clamped to one request per window.
    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        let quota = quota_from_window(window, requests_per_window);
        Self {
            limiter: RateLimiter::direct(quota),
            requests_per_window: requests_per_window.max(1),
            window,
        }
    }

    pub const fn requests_per_window(&self) -> u32 {
        self.requests_per_window
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Wait until the next request fits inside the quota.
    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }

    /// Non-blocking probe, mostly useful in tests.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let safe_limit = limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}

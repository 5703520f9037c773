//! Retry policy for archive fetches: exponential backoff with jitter, and
//! a longer ladder for rate-limit responses.

use std::time::Duration;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            factor: 2.0,
            max: Duration::from_secs(3),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Calculate the delay for a given retry attempt (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                // Apply jitter: +/- 50% of the delay
                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Per-archive retry policy applied by the fetcher.
///
/// Retries never cross archives: each identifier carries its own attempt
/// counter, and exhausting the budget surfaces the final error for that
/// archive alone.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism.
    pub enabled: bool,
    /// The maximum number of retries per archive.
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Backoff between retries of transient failures.
    pub backoff: Backoff,
    /// Backoff between retries after a rate-limit response. The service
    /// throttles aggressively, so this ladder is much slower than
    /// [`backoff`](Self::backoff).
    pub rate_limit_backoff: Backoff,
    /// HTTP status codes that count as transient.
    pub retry_on_status: Vec<u16>,
    /// Budget for one HTTP attempt; archives run to tens of megabytes.
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            backoff: Backoff::default(),
            rate_limit_backoff: Backoff::Exponential {
                base: Duration::from_secs(2),
                factor: 2.0,
                max: Duration::from_secs(30),
                jitter: true,
            },
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            timeout_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Exponential-backoff policy with a custom retry budget.
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Fixed-delay policy, mostly useful in tests.
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            rate_limit_backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    /// Disable retries; the first failure of each archive is final.
    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total number of attempts per archive, counting the first.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }

    /// Whether a given HTTP status code counts as transient.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Delay before the given retry attempt of a transient failure.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Delay before the given retry attempt after a rate-limit response.
    pub fn rate_limit_delay_for_attempt(&self, attempt: u32) -> Duration {
        self.rate_limit_backoff.delay(attempt)
    }
}

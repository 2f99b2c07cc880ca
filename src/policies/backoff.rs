//! # Backoff policy for reconnect attempts.
//!
//! [`BackoffPolicy`] controls how the delay between reconnect attempts grows
//! after consecutive failures. It is parameterized by:
//! - [`BackoffPolicy::strategy`] the growth curve ([`BackoffStrategy`]);
//! - [`BackoffPolicy::initial`] the delay before the first retry;
//! - [`BackoffPolicy::max`] the cap applied before jitter;
//! - [`BackoffPolicy::randomization_factor`] the jitter factor in `[0, 1)`;
//! - [`BackoffPolicy::fail_after`] the optional bound on consecutive failures.
//!
//! The base delay for attempt index `k` (0-based) is:
//! - exponential: `initial × 2^k`
//! - fibonacci:   `initial × F(k)` with `F = 1, 1, 2, 3, 5, 8, ...`
//!
//! clamped to `max`, then randomized by up to `± randomization_factor` of itself.
//! The base is derived from the attempt index only, so jitter never feeds back
//! into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use redial::{BackoffPolicy, BackoffStrategy};
//!
//! let backoff = BackoffPolicy {
//!     strategy: BackoffStrategy::Fibonacci,
//!     initial: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     randomization_factor: 0.0,
//!     fail_after: None,
//! };
//!
//! assert_eq!(backoff.delay(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay(2), Duration::from_millis(200));
//! assert_eq!(backoff.delay(4), Duration::from_millis(500));
//! assert_eq!(backoff.delay(20), Duration::from_secs(1));
//! ```

use std::time::Duration;

use rand::Rng;

use crate::error::ReconnectError;
use crate::policies::jitter;

/// Growth curve of the reconnect delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// `initial × 2^k`.
    Exponential,
    /// `initial × F(k)`, where `F` is `1, 1, 2, 3, 5, ...` (default).
    #[default]
    Fibonacci,
}

impl BackoffStrategy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackoffStrategy::Exponential => "exponential",
            BackoffStrategy::Fibonacci => "fibonacci",
        }
    }

    /// Multiplier applied to the initial delay for attempt index `k`.
    fn multiplier(&self, k: u32) -> f64 {
        match self {
            BackoffStrategy::Exponential => {
                let exp = k.min(i32::MAX as u32) as i32;
                2.0f64.powi(exp)
            }
            BackoffStrategy::Fibonacci => fibonacci(k),
        }
    }
}

/// `F(0) = F(1) = 1`; saturates at infinity instead of looping for huge `n`.
fn fibonacci(n: u32) -> f64 {
    let (mut prev, mut curr) = (0.0f64, 1.0f64);
    for _ in 0..n {
        let next = prev + curr;
        prev = curr;
        curr = next;
        if curr.is_infinite() {
            break;
        }
    }
    curr
}

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Growth curve.
    pub strategy: BackoffStrategy,
    /// Delay before the first retry.
    pub initial: Duration,
    /// Cap for the base delay (jitter is applied after the cap).
    pub max: Duration,
    /// Jitter factor in `[0, 1)`; `0.0` disables randomization.
    pub randomization_factor: f64,
    /// Consecutive failed attempts tolerated before giving up (`None` = retry forever).
    pub fail_after: Option<u32>,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `strategy = Fibonacci`;
    /// - `initial = 1s`;
    /// - `max = 20s`;
    /// - `randomization_factor = 0.2`;
    /// - `fail_after = None` (unbounded).
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Fibonacci,
            initial: Duration::from_millis(1_000),
            max: Duration::from_millis(20_000),
            randomization_factor: 0.2,
            fail_after: None,
        }
    }
}

impl BackoffPolicy {
    /// Default policy with the exponential curve.
    pub fn exponential() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            ..Self::default()
        }
    }

    /// Default policy with the fibonacci curve.
    pub fn fibonacci() -> Self {
        Self::default()
    }

    /// Computes the base delay (no jitter) for the given attempt index (0-based).
    ///
    /// Overflowing or non-finite intermediate values clamp to [`BackoffPolicy::max`].
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let unclamped_secs = self.initial.as_secs_f64() * self.strategy.multiplier(attempt);

        if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
            return self.max;
        }
        // Near `Duration::MAX` the f64 round-trip can still overflow.
        Duration::try_from_secs_f64(unclamped_secs)
            .map_or(self.max, |d| d.min(self.max))
    }

    /// Computes the jittered delay for the given attempt index (0-based).
    pub fn next<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        jitter::randomize(self.delay(attempt), self.randomization_factor, rng)
    }

    /// Rejects parameter combinations the scheduler cannot honor.
    pub(crate) fn validate(&self) -> Result<(), ReconnectError> {
        let f = self.randomization_factor;
        if !f.is_finite() || !(0.0..1.0).contains(&f) {
            return Err(ReconnectError::invalid_config(format!(
                "randomization_factor must be in [0, 1), got {f}"
            )));
        }
        if self.initial.is_zero() {
            return Err(ReconnectError::invalid_config(
                "initial delay must be greater than zero",
            ));
        }
        if self.max < self.initial {
            return Err(ReconnectError::invalid_config(format!(
                "max delay {:?} is below initial delay {:?}",
                self.max, self.initial
            )));
        }
        if self.fail_after == Some(0) {
            return Err(ReconnectError::invalid_config(
                "fail_after must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

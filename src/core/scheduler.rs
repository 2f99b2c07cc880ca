//! # BackoffScheduler: attempt counting and the retry timer.
//!
//! Turns "the handle died" into either a scheduled retry or a declaration of
//! exhaustion, according to a [`BackoffPolicy`].
//!
//! ```text
//! failure() ──► n += 1
//!                 ├─ fail_after = Some(N) and n >= N ──► Exhausted { attempts: N }  (timer disarmed)
//!                 └─ otherwise ──► delay = policy.next(n - 1) ──► arm timer ──► Scheduled
//!
//! ready().await ──► resolves when the armed timer elapses (then disarms)
//! reset()       ──► n = 0, timer disarmed
//! ```
//!
//! ## Rules
//! - At most one timer is armed; arming replaces the previous one.
//! - `ready()` never resolves while no timer is armed, and is cancel-safe, so the
//!   actor can keep it in a `select!` arm permanently.
//! - Once exhausted the counter stays at `fail_after` until `reset()`.

use std::future;
use std::pin::Pin;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::time::Sleep;
#[cfg(test)]
use tokio::time::Instant;

use crate::policies::BackoffPolicy;

/// Outcome of a failure signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Backoff {
    /// A retry timer was armed.
    Scheduled { attempt: u32, delay: Duration },
    /// `fail_after` reached; no timer armed.
    Exhausted { attempts: u32 },
}

pub(crate) struct BackoffScheduler {
    policy: BackoffPolicy,
    attempts: u32,
    timer: Option<Pin<Box<Sleep>>>,
    rng: StdRng,
}

impl BackoffScheduler {
    pub(crate) fn new(policy: BackoffPolicy, rng: StdRng) -> Self {
        Self {
            policy,
            attempts: 0,
            timer: None,
            rng,
        }
    }

    /// Consecutive failures since the last reset.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True while a retry timer is armed.
    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Deadline of the armed timer, if any.
    #[cfg(test)]
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(|t| t.deadline())
    }

    /// Records one failed attempt and arms the next retry, or reports exhaustion.
    pub(crate) fn failure(&mut self) -> Backoff {
        if let Some(limit) = self.policy.fail_after {
            if self.attempts >= limit {
                self.timer = None;
                return Backoff::Exhausted { attempts: limit };
            }
        }

        self.attempts += 1;
        if let Some(limit) = self.policy.fail_after {
            if self.attempts >= limit {
                self.attempts = limit;
                self.timer = None;
                return Backoff::Exhausted { attempts: limit };
            }
        }

        let delay = self.policy.next(self.attempts - 1, &mut self.rng);
        self.timer = Some(Box::pin(tokio::time::sleep(delay)));
        Backoff::Scheduled {
            attempt: self.attempts,
            delay,
        }
    }

    /// Clears the counter and cancels any armed timer.
    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
        self.timer = None;
    }

    /// Completes when the armed timer fires; returns the attempt it was armed for.
    pub(crate) async fn ready(&mut self) -> u32 {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
                self.attempts
            }
            None => future::pending().await,
        }
    }
}

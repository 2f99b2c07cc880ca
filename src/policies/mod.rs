//! Backoff policies.
//!
//! This module groups the knobs that control **how long** to wait between
//! reconnect attempts and **when** to give up.
//!
//! ## Contents
//! - [`BackoffPolicy`]   delay curve, cap, jitter factor and `fail_after` bound
//! - [`BackoffStrategy`] exponential or fibonacci growth
//! - `jitter`            proportional randomization applied after the cap
//!
//! ## Quick wiring
//! ```text
//! Config { backoff: BackoffPolicy, .. }
//!      └─► core::scheduler::BackoffScheduler uses:
//!           - fail_after to declare exhaustion
//!           - backoff.next(attempt - 1, rng) to arm the retry timer
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → fibonacci, initial=1s, max=20s, factor=0.2, unbounded.

mod backoff;
mod jitter;

pub use backoff::{BackoffPolicy, BackoffStrategy};

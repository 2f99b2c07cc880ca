//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the internal `SubscriberSet` fan-out
//! and, behind the `logging` feature, a built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Lifecycle ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet::emit
//!                                  │                                   │
//!                                  │                          ┌────────┼────────┐
//!                                  │                          ▼        ▼        ▼
//!                                  │                      LogWriter  Metrics  Custom
//!                                  │
//!                                  └──► Reconnector::subscribe() (raw receivers)
//! ```
//!
//! Use a [`Subscribe`] implementation for long-lived observers; use
//! [`Reconnector::subscribe`](crate::Reconnector::subscribe) when a plain
//! channel is more convenient (tests, one-off waits).

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub(crate) use subscriber_set::SubscriberSet;

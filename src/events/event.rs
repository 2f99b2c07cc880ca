//! # Events published by a reconnector.
//!
//! The [`EventKind`] enum classifies events in three categories:
//! - **Diagnostics**: non-actionable progress notes (`Info`)
//! - **Transitions**: every change of [`ConnectionState`] (`StateChanged`)
//! - **Terminal**: backoff exhausted, once per failure episode (`Failed`)
//!
//! plus two health events about the subscriber fan-out itself.
//!
//! The [`Event`] struct carries metadata such as the instance name, timestamp,
//! attempt number and scheduled delay.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use redial::{ConnectionState, Event, EventKind};
//!
//! let ev = Event::new(EventKind::StateChanged)
//!     .with_name("upstream")
//!     .with_state(ConnectionState::Closed)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(1500));
//!
//! assert_eq!(ev.kind, EventKind::StateChanged);
//! assert_eq!(ev.state, Some(ConnectionState::Closed));
//! assert_eq!(ev.delay_ms, Some(1500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::ConnectionState;
use crate::error::ReconnectError;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of reconnector events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Reconnector events ===
    /// Diagnostic note (creating, destroying, backing off, transient errors...).
    ///
    /// Sets:
    /// - `name`: instance name
    /// - `reason`: the message
    /// - `attempt`, `delay_ms`: when a retry was scheduled
    /// - `at`, `seq`
    Info,

    /// The connection state changed.
    ///
    /// Sets:
    /// - `name`: instance name
    /// - `state`: the new state
    /// - `at`, `seq`
    StateChanged,

    /// Backoff exhausted; the reconnector entered `Failed`.
    ///
    /// Sets:
    /// - `name`: instance name
    /// - `attempt`: consecutive failed attempts
    /// - `reason`: message of the last handle error
    /// - `error`: the full [`ReconnectError`]
    /// - `at`, `seq`
    Failed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`, `seq`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`, `seq`
    SubscriberOverflow,
}

/// Reconnector event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the reconnector (or subscriber, for subscriber events).
    pub name: Option<Arc<str>>,
    /// New state (only for `StateChanged`).
    pub state: Option<ConnectionState>,
    /// Human-readable message.
    pub reason: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Scheduled retry delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Terminal error (only for `Failed`).
    pub error: Option<ReconnectError>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            name: None,
            state: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            error: None,
        }
    }

    /// Attaches the instance name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches the new state.
    #[inline]
    pub fn with_state(mut self, state: ConnectionState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches the terminal error; also sets `reason` to its message.
    #[inline]
    pub fn with_error(mut self, err: ReconnectError) -> Self {
        self.reason = Some(err.as_message().into());
        self.error = Some(err);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_state(&self, state: ConnectionState) -> bool {
        self.kind == EventKind::StateChanged && self.state == Some(state)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

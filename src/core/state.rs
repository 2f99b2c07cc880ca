//! # Connection states.
//!
//! ```text
//!            start()                 opened            closed (retry left)
//!  Stopped ──────────► Opening ───────────► Opened ─────────────────► Closed
//!     ▲                   │                    ▲                        │
//!     │ stop()            │ closed             │ opened          ready  │
//!     │ (any state)       └────► Closed        └──────── Reopening ◄────┘
//!     │
//!  Closing ◄── stop() while a handle is held
//!
//!  closed (no retry left) ──► Failed ── start() ──► Opening
//! ```

use std::fmt;

/// Lifecycle state of the managed handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not running; no handle, no timer (initial state).
    #[default]
    Stopped,
    /// First handle of a session is being created/connected.
    Opening,
    /// The handle reported it is open.
    Opened,
    /// A held handle is being torn down by `stop()`.
    Closing,
    /// The handle died; a retry timer is armed.
    Closed,
    /// A replacement handle is being created/connected.
    Reopening,
    /// Backoff exhausted; nothing happens until the next `start()`.
    Failed,
}

impl ConnectionState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionState::Stopped => "stopped",
            ConnectionState::Opening => "opening",
            ConnectionState::Opened => "opened",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
            ConnectionState::Reopening => "reopening",
            ConnectionState::Failed => "failed",
        }
    }

    /// True while a handle is being connected (`Opening` or `Reopening`).
    #[inline]
    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionState::Opening | ConnectionState::Reopening)
    }

    /// True for the states that imply no handle and no pending retry.
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, ConnectionState::Stopped | ConnectionState::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

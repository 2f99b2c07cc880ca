//! Error types used by the reconnector and its hooks.
//!
//! - [`HandleError`]: transient errors reported by a live handle through
//!   [`Link::error`](crate::Link::error). They never stop the state machine.
//! - [`ReconnectError`]: errors raised by the reconnector itself: exhaustion of
//!   the backoff bound, rejected configuration, use after shutdown.
//!
//! [`ReconnectError`] provides `as_label`/`as_message` helpers for logs/metrics.

use std::sync::Arc;

use thiserror::Error;

/// Type-erased error reported by a handle.
///
/// Shared (`Arc`) so the same value can be kept as the last error, attached to
/// events and handed to [`Hooks::on_fail`](crate::Hooks::on_fail).
pub type HandleError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the reconnector.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ReconnectError {
    /// The backoff bound was reached without a successful open in between.
    #[error("gave up after {attempts} consecutive attempts: {}", describe(.last))]
    Exhausted {
        /// Number of consecutive failed attempts (equals `fail_after`).
        attempts: u32,
        /// The most recent error reported by a handle, if any.
        last: Option<HandleError>,
    },

    /// Configuration rejected at build time.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// The reconnector was shut down; no command can be delivered.
    #[error("reconnector is shut down")]
    Closed,
}

fn describe(last: &Option<HandleError>) -> String {
    match last {
        Some(err) => err.to_string(),
        None => "no error reported".to_string(),
    }
}

impl ReconnectError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        ReconnectError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use redial::ReconnectError;
    ///
    /// let err = ReconnectError::Exhausted { attempts: 3, last: None };
    /// assert_eq!(err.as_label(), "exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ReconnectError::Exhausted { .. } => "exhausted",
            ReconnectError::InvalidConfig { .. } => "invalid_config",
            ReconnectError::Closed => "closed",
        }
    }

    /// Returns a human-readable message.
    ///
    /// For [`ReconnectError::Exhausted`] this is the message of the last handle
    /// error, which is usually what an operator wants to see.
    pub fn as_message(&self) -> String {
        match self {
            ReconnectError::Exhausted { last: Some(err), .. } => err.to_string(),
            ReconnectError::Exhausted { attempts, last: None } => {
                format!("gave up after {attempts} attempts")
            }
            ReconnectError::InvalidConfig { reason } => reason.clone(),
            ReconnectError::Closed => "reconnector is shut down".to_string(),
        }
    }

    /// The last handle error carried by [`ReconnectError::Exhausted`].
    pub fn last_error(&self) -> Option<&HandleError> {
        match self {
            ReconnectError::Exhausted { last, .. } => last.as_ref(),
            _ => None,
        }
    }
}

//! # LogWriter: renders events through `tracing`
//!
//! A minimal subscriber that forwards incoming [`Event`]s to the `tracing`
//! macros, so whatever `tracing` subscriber the application installed decides
//! where they end up.
//!
//! | Event kind           | Level   |
//! |----------------------|---------|
//! | `Info`               | `debug` |
//! | `StateChanged`       | `info`  |
//! | `Failed`             | `error` |
//! | `Subscriber*`        | `warn`  |
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  redial: state changed name="rs-3fa1" state=opening
//! DEBUG redial: creating new handle name="rs-3fa1"
//! DEBUG redial: backing off name="rs-3fa1" attempt=1 delay_ms=1000
//! INFO  redial: state changed name="rs-3fa1" state=closed
//! ERROR redial: reconnect failed name="rs-3fa1" attempts=3 err="connection refused"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let name = e.name.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::Info => {
                tracing::debug!(
                    target: "redial",
                    name,
                    attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    "{reason}"
                );
            }
            EventKind::StateChanged => {
                let state = e.state.map(|s| s.as_label()).unwrap_or("unknown");
                tracing::info!(target: "redial", name, state, "state changed");
            }
            EventKind::Failed => {
                tracing::error!(
                    target: "redial",
                    name,
                    attempts = e.attempt,
                    err = reason,
                    "reconnect failed"
                );
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "redial", subscriber = name, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "redial", subscriber = name, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

//! # Link: callbacks bound to one handle.
//!
//! A [`Link`] is given to [`Hooks::create`](crate::Hooks::create). The transport
//! keeps it (or clones of it) and reports what happens to the handle:
//!
//! ```text
//! transport task ── link.opened() ─┐
//!                ── link.error(e) ─┼──► unbounded channel ──► actor ──► Lifecycle
//!                ── link.closed() ─┘         (Command::Signal { epoch, .. })
//! ```
//!
//! ## Rules
//! - Reporting never blocks and never fails, so it is safe from sync code,
//!   async tasks, other threads, and from inside `create` itself.
//! - Signals are queued; the lifecycle handles them after the current hook returns.
//! - Every signal carries the epoch of the handle the link was created for.
//!   Signals from a handle that was already closed or destroyed are ignored.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

use crate::core::ConnectionState;
use crate::error::HandleError;

/// What a handle reported.
pub(crate) enum Signal {
    Opened,
    Closed,
    Error(HandleError),
}

/// Everything the actor serializes into the lifecycle.
pub(crate) enum Command {
    Start(oneshot::Sender<ConnectionState>),
    Stop(oneshot::Sender<ConnectionState>),
    Signal { epoch: u64, signal: Signal },
}

/// Handle-scoped callbacks into the reconnector.
#[derive(Clone)]
pub struct Link {
    tx: mpsc::UnboundedSender<Command>,
    epoch: u64,
}

impl Link {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>, epoch: u64) -> Self {
        Self { tx, epoch }
    }

    /// Reports that the handle is open.
    pub fn opened(&self) {
        self.send(Signal::Opened);
    }

    /// Reports that the handle is closed (or never managed to open).
    pub fn closed(&self) {
        self.send(Signal::Closed);
    }

    /// Reports a transient error; it becomes the reconnector's last error.
    pub fn error<E>(&self, err: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.send(Signal::Error(std::sync::Arc::new(err)));
    }

    /// Same as [`Link::error`] for an already shared error.
    pub fn error_shared(&self, err: HandleError) {
        self.send(Signal::Error(err));
    }

    /// Epoch of the handle this link belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True once the reconnector behind this link has shut down.
    pub fn is_detached(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, signal: Signal) {
        // A closed channel means the reconnector is gone; nothing left to notify.
        let _ = self.tx.send(Command::Signal {
            epoch: self.epoch,
            signal,
        });
    }

    /// A link whose receiving side is returned to the caller.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, 0), rx)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("epoch", &self.epoch).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn signals_carry_epoch_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = Link::new(tx, 5);

        link.error(io::Error::other("refused"));
        link.closed();

        match rx.try_recv() {
            Ok(Command::Signal {
                epoch: 5,
                signal: Signal::Error(err),
            }) => assert_eq!(err.to_string(), "refused"),
            _ => panic!("expected error signal"),
        }
        assert!(matches!(
            rx.try_recv(),
            Ok(Command::Signal {
                epoch: 5,
                signal: Signal::Closed
            })
        ));
    }

    #[test]
    fn shared_error_is_forwarded_without_rewrapping() {
        let (link, mut rx) = Link::detached();
        let err: HandleError = std::sync::Arc::new(io::Error::other("reset"));

        link.error_shared(err.clone());

        match rx.try_recv() {
            Ok(Command::Signal {
                signal: Signal::Error(got),
                ..
            }) => assert!(std::sync::Arc::ptr_eq(&got, &err)),
            _ => panic!("expected error signal"),
        }
    }

    #[test]
    fn reporting_after_shutdown_is_silent() {
        let (link, rx) = Link::detached();
        drop(rx);
        assert!(link.is_detached());
        link.opened();
        link.closed();
    }
}

//! # Reconnector: public handle to a running lifecycle actor.
//!
//! Created by [`ReconnectorBuilder::build`]. Cheap queries (`name`, `state`)
//! read shared values; `start`/`stop` travel through the actor's command queue
//! and resolve with the state the lifecycle reached after handling them.
//!
//! ```text
//! Reconnector ── Command::Start/Stop(ack) ──► actor ──► Lifecycle
//!      ▲                                                  │
//!      ├── watch::Receiver<ConnectionState> ◄─ send_replace┤
//!      └── Bus::subscribe()                 ◄─ publish ────┘
//! ```
//!
//! ## Shutdown
//! - [`Reconnector::shutdown`] cancels the actor (which stops the lifecycle),
//!   waits for it, then drains subscriber workers.
//! - Dropping the handle cancels both tasks without waiting.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::link::Command;
use crate::core::{Config, ConnectionState, ReconnectorBuilder};
use crate::error::ReconnectError;
use crate::events::{Bus, Event};
use crate::hooks::Hooks;

/// Keeps one connection alive through the given [`Hooks`].
///
/// ## Example
/// ```rust
/// use redial::{Config, ConnectionState, HookFn, Reconnector};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), redial::ReconnectError> {
///     let hooks = HookFn::new(
///         |link, _first_open| {
///             link.opened();
///             link
///         },
///         |_link| {},
///     );
///     let rc = Reconnector::builder(Config::default(), hooks).build()?;
///
///     assert_eq!(rc.start().await?, ConnectionState::Opening);
///     rc.stop().await?;
///     rc.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Reconnector {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    bus: Bus,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    actor: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl Reconnector {
    /// Returns a builder for a reconnector driving `hooks`.
    pub fn builder<H: Hooks>(cfg: Config, hooks: H) -> ReconnectorBuilder<H> {
        ReconnectorBuilder::new(cfg, hooks)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        name: Arc<str>,
        tx: mpsc::UnboundedSender<Command>,
        state_rx: watch::Receiver<ConnectionState>,
        bus: Bus,
        runtime_token: CancellationToken,
        listener_token: CancellationToken,
        actor: JoinHandle<()>,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            name,
            tx,
            state_rx,
            bus,
            runtime_token,
            listener_token,
            actor: Some(actor),
            listener,
        }
    }

    /// Instance name attached to every event.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last state published by the lifecycle.
    ///
    /// If the actor died (a hook panicked), this keeps returning the state it
    /// had at that moment; check [`Reconnector::is_closed`].
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// True once the lifecycle actor is gone and no command can be delivered.
    pub fn is_closed(&self) -> bool {
        self.state_rx.has_changed().is_err()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Subscribes to the raw event stream.
    ///
    /// Only events published after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Starts keeping the connection alive.
    ///
    /// Idempotent: returns the current state unchanged unless it is `Stopped`
    /// or `Failed`; otherwise returns `Opening`.
    pub async fn start(&self) -> Result<ConnectionState, ReconnectError> {
        self.request(Command::Start).await
    }

    /// Destroys the handle, cancels any pending retry and settles in `Stopped`.
    pub async fn stop(&self) -> Result<ConnectionState, ReconnectError> {
        self.request(Command::Stop).await
    }

    /// Stops the lifecycle, waits for the actor, then drains subscriber workers.
    pub async fn shutdown(mut self) {
        self.runtime_token.cancel();
        if let Some(actor) = self.actor.take() {
            if let Err(e) = actor.await {
                tracing::warn!(name = %self.name, error = %e, "lifecycle actor ended abnormally");
            }
        }

        self.listener_token.cancel();
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.await {
                tracing::warn!(name = %self.name, error = %e, "subscriber listener ended abnormally");
            }
        }
        tracing::debug!(name = %self.name, "reconnector shut down");
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<ConnectionState>) -> Command,
    ) -> Result<ConnectionState, ReconnectError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(make(ack_tx))
            .map_err(|_| ReconnectError::Closed)?;
        ack_rx.await.map_err(|_| ReconnectError::Closed)
    }
}

impl Drop for Reconnector {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.listener_token.cancel();
    }
}

impl std::fmt::Debug for Reconnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconnector")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

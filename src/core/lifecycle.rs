//! # Lifecycle: the reconnect state machine.
//!
//! Owns the single handle, the [`ConnectionState`], the first-open flag, the
//! last reported error and the [`BackoffScheduler`]. Every method runs to
//! completion synchronously; the actor feeds it one input at a time.
//!
//! ## Transitions
//! ```text
//! Stopped/Failed ── start ──► Opening     reset backoff, first_open = true, create
//! Opening/Reopening ── opened ──► Opened  on_open(handle, first_open), reset backoff
//! Opening/Reopening/Opened ── closed ──►  on_close(handle), drop handle, then
//!                                           ├─ retry armed  ──► Closed
//!                                           └─ exhausted    ──► Failed
//! Closed ── ready ──► Reopening           destroy stale handle, create
//! Opening/Reopening/Opened ── error       remember as last error
//! any ── stop ──► [Closing] ──► Stopped   destroy handle, reset backoff
//! exhausted ──► Failed                    destroy handle, publish Failed, on_fail, Failed event
//! ```
//!
//! ## Rules
//! - At most one handle exists; `create_handle` is a no-op while one is held.
//! - A new handle is created only after the previous one was dropped or destroyed.
//! - Signals are accepted only from the live handle's epoch.
//! - `ready` is honored only in `Closed`; `stop` disarms the timer anyway.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::core::link::{Command, Link, Signal};
use crate::core::scheduler::{Backoff, BackoffScheduler};
use crate::core::ConnectionState;
use crate::error::{HandleError, ReconnectError};
use crate::events::{Bus, Event, EventKind};
use crate::hooks::Hooks;

pub(crate) struct Lifecycle<H: Hooks> {
    name: Arc<str>,
    hooks: H,
    handle: Option<H::Handle>,
    /// Bumped on every create; links carry the value they were created with.
    epoch: u64,
    state: ConnectionState,
    first_open: bool,
    last_error: Option<HandleError>,
    backoff: BackoffScheduler,
    bus: Bus,
    state_tx: watch::Sender<ConnectionState>,
    link_tx: mpsc::UnboundedSender<Command>,
}

impl<H: Hooks> Lifecycle<H> {
    pub(crate) fn new(
        name: Arc<str>,
        hooks: H,
        backoff: BackoffScheduler,
        bus: Bus,
        state_tx: watch::Sender<ConnectionState>,
        link_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            name,
            hooks,
            handle: None,
            epoch: 0,
            state: ConnectionState::Stopped,
            first_open: false,
            last_error: None,
            backoff,
            bus,
            state_tx,
            link_tx,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    /// Dispatches one serialized input.
    pub(crate) fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start(ack) => {
                self.start();
                let _ = ack.send(self.state);
            }
            Command::Stop(ack) => {
                self.stop();
                let _ = ack.send(self.state);
            }
            Command::Signal { epoch, signal } => self.signal(epoch, signal),
        }
    }

    pub(crate) fn start(&mut self) {
        if !self.state.is_idle() {
            self.info(format!("already started ({})", self.state));
            return;
        }
        self.info("starting");
        self.backoff.reset();
        self.last_error = None;
        self.first_open = true;
        self.set_state(ConnectionState::Opening);
        self.create_handle();
    }

    pub(crate) fn stop(&mut self) {
        self.info("stopping");
        if self.handle.is_some() {
            self.set_state(ConnectionState::Closing);
        }
        self.destroy_handle();
        self.backoff.reset();
        self.last_error = None;
        self.first_open = false;
        self.set_state(ConnectionState::Stopped);
    }

    /// Waits for the armed retry timer; pending forever when none is armed.
    pub(crate) async fn backoff_ready(&mut self) -> u32 {
        self.backoff.ready().await
    }

    pub(crate) fn on_ready(&mut self, attempt: u32) {
        if self.state != ConnectionState::Closed {
            self.info(format!("retry timer fired while {}, ignored", self.state));
            return;
        }
        self.publish_info(
            self.event(EventKind::Info)
                .with_reason("done waiting")
                .with_attempt(attempt),
        );
        if self.handle.is_some() {
            self.destroy_handle();
        }
        self.set_state(ConnectionState::Reopening);
        self.create_handle();
    }

    fn signal(&mut self, epoch: u64, signal: Signal) {
        if self.handle.is_none() || epoch != self.epoch {
            let what = match signal {
                Signal::Opened => "open",
                Signal::Closed => "close",
                Signal::Error(_) => "error",
            };
            self.info(format!("ignoring {what} from stale handle (epoch {epoch})"));
            return;
        }
        match signal {
            Signal::Opened => self.did_open(),
            Signal::Closed => self.did_close(),
            Signal::Error(err) => self.did_error(err),
        }
    }

    fn did_open(&mut self) {
        if !self.state.is_connecting() {
            self.info(format!("open reported while {}, ignored", self.state));
            return;
        }
        let first_open = self.first_open;
        if let Some(handle) = self.handle.as_mut() {
            self.hooks.on_open(handle, first_open);
        }
        self.set_state(ConnectionState::Opened);
        self.info(if first_open {
            "handle opened"
        } else {
            "handle reopened"
        });
        self.first_open = false;
        self.backoff.reset();
    }

    fn did_close(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        self.hooks.on_close(&mut handle);
        drop(handle);
        self.info("handle closed");

        match self.backoff.failure() {
            Backoff::Scheduled { attempt, delay } => {
                self.publish_info(
                    self.event(EventKind::Info)
                        .with_reason("backing off")
                        .with_attempt(attempt)
                        .with_delay(delay),
                );
                self.set_state(ConnectionState::Closed);
            }
            Backoff::Exhausted { attempts } => self.fail(attempts),
        }
    }

    fn did_error(&mut self, err: HandleError) {
        if self.state.is_connecting() {
            let attempt = self.backoff.attempts() + 1;
            self.publish_info(
                self.event(EventKind::Info)
                    .with_reason(format!("error during open attempt {attempt}: {err}"))
                    .with_attempt(attempt),
            );
        }
        self.last_error = Some(err);
    }

    fn fail(&mut self, attempts: u32) {
        self.info(format!(
            "failed to connect after {attempts} consecutive tries"
        ));
        if self.handle.is_some() {
            self.destroy_handle();
        }
        let err = ReconnectError::Exhausted {
            attempts,
            last: self.last_error.take(),
        };
        tracing::warn!(name = %self.name, attempts, err = %err, "reconnect attempts exhausted");

        self.set_state(ConnectionState::Failed);
        self.hooks.on_fail(&err);
        self.bus.publish(
            self.event(EventKind::Failed)
                .with_attempt(attempts)
                .with_error(err),
        );
    }

    fn create_handle(&mut self) {
        if self.handle.is_some() {
            self.info("handle already created");
            return;
        }
        self.info("creating new handle");
        self.epoch += 1;
        let link = Link::new(self.link_tx.clone(), self.epoch);
        self.handle = Some(self.hooks.create(link, self.first_open));
    }

    fn destroy_handle(&mut self) {
        match self.handle.take() {
            Some(handle) => {
                self.info("destroying handle");
                self.hooks.destroy(handle);
            }
            None => self.info("handle already destroyed"),
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.state_tx.send_replace(state);
        self.bus
            .publish(self.event(EventKind::StateChanged).with_state(state));
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_name(Arc::clone(&self.name))
    }

    fn info(&self, msg: impl Into<Arc<str>>) {
        self.publish_info(self.event(EventKind::Info).with_reason(msg));
    }

    fn publish_info(&self, ev: Event) {
        tracing::debug!(
            name = %self.name,
            attempt = ev.attempt,
            delay_ms = ev.delay_ms,
            "{}",
            ev.reason.as_deref().unwrap_or("")
        );
        self.bus.publish(ev);
    }
}

#[cfg(test)]
impl<H: Hooks> Lifecycle<H> {
    pub(crate) fn attempts(&self) -> u32 {
        self.backoff.attempts()
    }

    pub(crate) fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn retry_pending(&self) -> bool {
        self.backoff.is_pending()
    }

    pub(crate) fn hooks(&self) -> &H {
        &self.hooks
    }
}

//! # LifecycleActor: the single thread of control.
//!
//! Owns the [`Lifecycle`] and serializes every input into it:
//!
//! ```text
//! loop {
//!   select! (biased) {
//!     runtime_token.cancelled()  ─► exit
//!     commands.recv()            ─► Start / Stop / Signal{epoch, ..} ─► lifecycle.handle()
//!     lifecycle.backoff_ready()  ─► lifecycle.on_ready(attempt)
//!   }
//! }
//! on exit: stop() unless already Stopped (handle destroyed, timer cancelled)
//! ```
//!
//! ## Rules
//! - No two inputs are processed concurrently; hooks run inside this task.
//! - Commands win over a simultaneously expired timer, so a `stop()` queued
//!   before the timer fires always disarms it first.
//! - The timer future is recreated each iteration; dropping it never loses the
//!   armed deadline.

use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::ConnectionState;
use crate::core::lifecycle::Lifecycle;
use crate::core::link::Command;
use crate::hooks::Hooks;

pub(crate) struct LifecycleActor<H: Hooks> {
    lifecycle: Lifecycle<H>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl<H: Hooks> LifecycleActor<H> {
    pub(crate) fn new(lifecycle: Lifecycle<H>, commands: mpsc::UnboundedReceiver<Command>) -> Self {
        Self {
            lifecycle,
            commands,
        }
    }

    /// Runs until `runtime_token` is cancelled.
    pub(crate) async fn run(mut self, runtime_token: CancellationToken) {
        loop {
            select! {
                biased;
                _ = runtime_token.cancelled() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.lifecycle.handle(cmd),
                    None => break,
                },
                attempt = self.lifecycle.backoff_ready() => self.lifecycle.on_ready(attempt),
            }
        }

        if self.lifecycle.state() != ConnectionState::Stopped {
            self.lifecycle.stop();
        }
        self.commands.close();
    }
}

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    actor::LifecycleActor, lifecycle::Lifecycle, reconnector::Reconnector,
    scheduler::BackoffScheduler,
};
use crate::{
    core::{Config, ConnectionState},
    error::ReconnectError,
    events::Bus,
    hooks::Hooks,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Reconnector`] with optional subscribers.
pub struct ReconnectorBuilder<H: Hooks> {
    cfg: Config,
    hooks: H,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<H: Hooks> ReconnectorBuilder<H> {
    /// Creates a new builder with the given configuration and hooks.
    pub fn new(cfg: Config, hooks: H) -> Self {
        Self {
            cfg,
            hooks,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every event through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validates the configuration and spawns the reconnector.
    ///
    /// This consumes the builder and initializes:
    /// - Event bus for broadcasting
    /// - Subscriber workers and their listener (if any subscriber was given)
    /// - The lifecycle actor, idle in `Stopped` until `start()`
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Reconnector, ReconnectError> {
        self.cfg.validate()?;

        let mut rng = self.cfg.rng();
        let name = self.cfg.resolve_name(&mut rng);
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Stopped);
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime_token = CancellationToken::new();
        let listener_token = CancellationToken::new();

        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            Some(spawn_listener(&bus, set, listener_token.clone()))
        };

        let lifecycle = Lifecycle::new(
            Arc::clone(&name),
            self.hooks,
            BackoffScheduler::new(self.cfg.backoff, rng),
            bus.clone(),
            state_tx,
            tx.clone(),
        );
        let actor = tokio::spawn(LifecycleActor::new(lifecycle, rx).run(runtime_token.clone()));

        tracing::debug!(%name, strategy = self.cfg.backoff.strategy.as_label(), "reconnector built");
        Ok(Reconnector::new_internal(
            name,
            tx,
            state_rx,
            bus,
            runtime_token,
            listener_token,
            actor,
            listener,
        ))
    }
}

/// Forwards bus events to the subscriber set until cancelled, then drains the workers.
fn spawn_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        set.shutdown().await;
    })
}

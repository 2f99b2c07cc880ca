//! # Per-subscriber delivery queues.
//!
//! [`SubscriberSet`] sits behind the builder's bus listener. Every subscriber
//! gets its own bounded queue and worker task, so a slow or failing
//! subscriber never delays the lifecycle actor or its peers.
//!
//! ```text
//! listener ── emit(&Event) ──► Arc<Event> ─┬─► [queue] ──► worker ──► on_event()
//!                                          └─► [queue] ──► worker ──► on_event()
//! ```
//!
//! ## Rules
//! - Queue full or worker gone: the event is skipped for that subscriber and a
//!   `SubscriberOverflow` event is published (never for an overflow event itself).
//! - A panic in `on_event` is caught and published as `SubscriberPanicked`;
//!   a panic while handling such a report is only logged.
//! - Events reach each subscriber in publish order.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Subscription {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
}

pub(crate) struct SubscriberSet {
    subscriptions: Vec<Subscription>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called within a tokio runtime.
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (subscriptions, workers) = subs
            .into_iter()
            .map(|sub| {
                let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let subscription = Subscription {
                    name: sub.name(),
                    queue,
                };
                (subscription, spawn_worker(sub, rx, bus.clone()))
            })
            .unzip();

        Self {
            subscriptions,
            workers,
            bus,
        }
    }

    /// Queues `event` for every subscriber without waiting.
    pub(crate) fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for sub in &self.subscriptions {
            let reason = match sub.queue.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !shared.is_subscriber_overflow() {
                self.bus.publish(Event::subscriber_overflow(sub.name, reason));
            }
        }
    }

    /// Closes every queue and waits until the workers have drained them.
    pub(crate) async fn shutdown(self) {
        drop(self.subscriptions);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

fn spawn_worker(
    sub: Arc<dyn Subscribe>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    bus: Bus,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let Err(payload) = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await else {
                continue;
            };
            let info = panic_message(payload.as_ref());
            tracing::warn!(subscriber = sub.name(), %info, "subscriber panicked");
            // Panics on panic reports are only logged.
            if ev.kind != EventKind::SubscriberPanicked {
                bus.publish(Event::subscriber_panicked(sub.name(), info));
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recorder {
        seen: Arc<Mutex<Vec<u64>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.seq);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _ev: &Event) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_drains_on_shutdown() {
        let bus = Bus::new(16);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(
            vec![Arc::new(Recorder { seen: seen.clone() })],
            bus.clone(),
        );

        let events: Vec<Event> = (0..5).map(|_| Event::new(EventKind::Info)).collect();
        for ev in &events {
            set.emit(ev);
        }
        set.shutdown().await;

        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn panic_is_reported_on_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicky)], bus.clone());

        set.emit(&Event::new(EventKind::Info));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.name.as_deref(), Some("panicky"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));

        // Its own panic report is not reported again.
        set.emit(&ev);
        set.shutdown().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stuck)], bus.clone());

        // First event is taken by the worker, second fills the queue.
        set.emit(&Event::new(EventKind::Info));
        tokio::task::yield_now().await;
        set.emit(&Event::new(EventKind::Info));
        set.emit(&Event::new(EventKind::Info));

        let ev = rx.recv().await.unwrap();
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=stuck reason=full"));
        while rx.try_recv().is_ok() {}

        // Overflow of an overflow event is dropped silently.
        set.emit(&ev);
        assert!(rx.try_recv().is_err());
    }
}

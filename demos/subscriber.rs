//! # Custom Subscriber Example
//!
//! Shows how to implement a custom event subscriber to track connection metrics.
//!
//! The example counts:
//! - Handle opens
//! - Scheduled retries
//! - Transient errors
//!
//! The transport is simulated: only every third attempt connects, and an open
//! connection drops after 300ms.
//!
//! ## Run
//! ```bash
//! cargo run --example subscriber
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU32, AtomicU64, Ordering},
    time::Duration,
};

use redial::{BackoffPolicy, Config, ConnectionState, Event, EventKind, HookFn, Link, Subscribe};
use tokio::task::JoinHandle;

struct MetricsSubscriber {
    opens: AtomicU64,
    retries: AtomicU64,
    errors: AtomicU64,
}

impl MetricsSubscriber {
    fn new() -> Self {
        Self {
            opens: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
    fn print_stats(&self) {
        println!();
        println!("Metrics:");
        println!(" ├─► Opens:   {}", self.opens.load(Ordering::Relaxed));
        println!(" ├─► Retries: {}", self.retries.load(Ordering::Relaxed));
        println!(" └─► Errors:  {}", self.errors.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for MetricsSubscriber {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::StateChanged if ev.is_state(ConnectionState::Opened) => {
                self.opens.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::Info if ev.delay_ms.is_some() => {
                self.retries.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::Info
                if ev
                    .reason
                    .as_deref()
                    .is_some_and(|r| r.starts_with("error during open attempt")) =>
            {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
    fn name(&self) -> &'static str {
        "metrics"
    }
    fn queue_capacity(&self) -> usize {
        1024
    }
}

#[derive(Debug, thiserror::Error)]
#[error("simulated connect failure #{0}")]
struct Refused(u32);

fn flaky_hooks() -> HookFn<JoinHandle<()>> {
    let counter = Arc::new(AtomicU32::new(0));

    HookFn::new(
        move |link: Link, _first_open| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                if n % 3 != 0 {
                    link.error(Refused(n));
                    link.closed();
                    return;
                }
                link.opened();
                tokio::time::sleep(Duration::from_millis(300)).await;
                link.closed();
            })
        },
        |task: JoinHandle<()>| task.abort(),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(MetricsSubscriber::new());
    let cfg = Config {
        backoff: BackoffPolicy {
            initial: Duration::from_millis(100),
            ..BackoffPolicy::exponential()
        },
        ..Config::default()
    };

    let rc = redial::Reconnector::builder(cfg, flaky_hooks())
        .with_subscribers(vec![Arc::clone(&metrics) as Arc<dyn Subscribe>])
        .build()?;
    println!("running {} for 3s", rc.name());

    rc.start().await?;
    tokio::time::sleep(Duration::from_secs(3)).await;
    rc.shutdown().await;

    metrics.print_stats();
    Ok(())
}

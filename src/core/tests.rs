//! End-to-end scenarios through the public [`Reconnector`] handle, on virtual time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::core::testing::{Mock, Step, test_policy};
use crate::core::{Config, ConnectionState, Link, Reconnector};
use crate::error::ReconnectError;
use crate::events::{Event, EventKind};
use crate::hooks::HookFn;
use crate::subscribers::Subscribe;

fn config(fail_after: Option<u32>) -> Config {
    Config {
        name: Some("scenario".into()),
        backoff: test_policy(fail_after),
        seed: Some(1),
        ..Config::default()
    }
}

fn spawn(mock: &Mock, fail_after: Option<u32>) -> Reconnector {
    Reconnector::builder(config(fail_after), mock.clone())
        .build()
        .expect("valid config")
}

async fn wait_state(rc: &Reconnector, want: ConnectionState) {
    let mut rx = rc.watch_state();
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| *s == want))
        .await
        .expect("timed out")
        .expect("actor gone");
}

async fn until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held");
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn states(events: &[Event]) -> Vec<ConnectionState> {
    events
        .iter()
        .filter(|e| e.kind == EventKind::StateChanged)
        .filter_map(|e| e.state)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn every_attempt_fails_until_fail_after() {
    let mock = Mock::new(vec![
        Step::Fail("boom 1"),
        Step::Fail("boom 2"),
        Step::Fail("boom 3"),
    ]);
    let rc = spawn(&mock, Some(3));
    let mut events = rc.subscribe();

    assert_eq!(rc.start().await.unwrap(), ConnectionState::Opening);
    wait_state(&rc, ConnectionState::Failed).await;
    let events = drain(&mut events);

    assert_eq!(
        states(&events),
        vec![
            ConnectionState::Opening,
            ConnectionState::Closed,
            ConnectionState::Reopening,
            ConnectionState::Closed,
            ConnectionState::Reopening,
            ConnectionState::Failed,
        ]
    );

    let diagnostics: Vec<&str> = events
        .iter()
        .filter_map(|e| e.reason.as_deref())
        .filter(|r| r.starts_with("error during open attempt"))
        .collect();
    assert_eq!(
        diagnostics,
        vec![
            "error during open attempt 1: boom 1",
            "error during open attempt 2: boom 2",
            "error during open attempt 3: boom 3",
        ]
    );

    let failed: Vec<&Event> = events
        .iter()
        .filter(|e| e.kind == EventKind::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].reason.as_deref(), Some("boom 3"));
    assert_eq!(failed[0].name.as_deref(), Some("scenario"));
    assert!(matches!(
        failed[0].error,
        Some(ReconnectError::Exhausted { attempts: 3, .. })
    ));
    assert_eq!(mock.fails(), vec!["boom 3".to_string()]);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(mock.creates().len(), 3);
    assert_eq!(rc.state(), ConnectionState::Failed);
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn recovers_after_one_failure() {
    let mock = Mock::new(vec![Step::Fail("refused"), Step::Open]);
    let rc = spawn(&mock, None);
    let mut events = rc.subscribe();

    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Opened).await;

    assert_eq!(
        states(&drain(&mut events)),
        vec![
            ConnectionState::Opening,
            ConnectionState::Closed,
            ConnectionState::Reopening,
            ConnectionState::Opened,
        ]
    );
    assert_eq!(mock.opens(), vec![true]);
    assert_eq!(mock.creates(), vec![true, true]);
    assert!(mock.fails().is_empty());
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn retry_waits_for_backoff_delay() {
    let mock = Mock::new(vec![Step::Fail("x"), Step::Fail("y"), Step::Open]);
    let rc = spawn(&mock, None);
    let started = tokio::time::Instant::now();

    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Opened).await;

    // Fibonacci from 100ms: 100 + 100.
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_millis(300));
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent_while_running() {
    let mock = Mock::new(vec![Step::Open]);
    let rc = spawn(&mock, None);

    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Opened).await;

    assert_eq!(rc.start().await.unwrap(), ConnectionState::Opened);
    assert_eq!(mock.creates().len(), 1);
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn at_most_one_handle_across_reconnects() {
    let mock = Mock::new(vec![
        Step::Open,
        Step::Fail("a"),
        Step::Open,
        Step::Fail("b"),
        Step::Fail("c"),
        Step::Open,
    ]);
    let rc = spawn(&mock, None);

    rc.start().await.unwrap();
    until(|| mock.opens().len() == 1).await;
    mock.close_live();
    until(|| mock.opens().len() == 2).await;
    mock.close_live();
    until(|| mock.opens().len() == 3).await;

    assert_eq!(mock.opens(), vec![true, false, false]);
    assert_eq!(mock.max_live(), 1);
    assert_eq!(mock.live(), 1);
    assert_eq!(mock.creates().len(), 6);
    rc.shutdown().await;
    assert_eq!(mock.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_retry() {
    let mock = Mock::new(vec![Step::Fail("x"), Step::Open]);
    let rc = spawn(&mock, None);

    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Closed).await;
    assert_eq!(rc.stop().await.unwrap(), ConnectionState::Stopped);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(mock.creates().len(), 1);
    assert_eq!(rc.state(), ConnectionState::Stopped);

    // A later start begins from scratch.
    assert_eq!(rc.start().await.unwrap(), ConnectionState::Opening);
    wait_state(&rc, ConnectionState::Opened).await;
    assert_eq!(mock.opens(), vec![true]);
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_stop_publishes_nothing() {
    let mock = Mock::new(vec![Step::Open]);
    let rc = spawn(&mock, None);
    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Opened).await;

    rc.stop().await.unwrap();
    let mut events = rc.subscribe();
    assert_eq!(rc.stop().await.unwrap(), ConnectionState::Stopped);

    assert!(states(&drain(&mut events)).is_empty());
    assert_eq!(mock.destroys(), 1);
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_and_detaches_links() {
    let mock = Mock::new(vec![Step::Open]);
    let rc = spawn(&mock, None);
    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Opened).await;
    let link = mock.last_link();

    rc.shutdown().await;

    assert_eq!(mock.live(), 0);
    assert_eq!(mock.destroys(), 1);
    assert!(link.is_detached());
    // Reporting into a shut down reconnector is harmless.
    link.closed();
}

#[tokio::test(start_paused = true)]
async fn panicking_hook_closes_the_reconnector() {
    let hooks = HookFn::new(
        |_link: Link, _first_open: bool| panic!("hook bug"),
        |_handle: ()| {},
    );
    let rc = Reconnector::builder(config(None), hooks).build().unwrap();
    assert!(!rc.is_closed());

    assert!(matches!(rc.start().await, Err(ReconnectError::Closed)));
    assert!(matches!(rc.stop().await, Err(ReconnectError::Closed)));
    assert!(rc.is_closed());
    // The last published state stays visible.
    assert_eq!(rc.state(), ConnectionState::Opening);
    rc.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let mut cfg = config(Some(0));
    let err = Reconnector::builder(cfg.clone(), Mock::default())
        .build()
        .unwrap_err();
    assert_eq!(err.as_label(), "invalid_config");

    cfg.backoff = test_policy(None);
    cfg.backoff.max = Duration::from_millis(1);
    assert!(Reconnector::builder(cfg, Mock::default()).build().is_err());
}

#[tokio::test(start_paused = true)]
async fn generated_name_is_stable_for_a_seed() {
    let cfg = Config {
        seed: Some(42),
        ..Config::default()
    };
    let a = Reconnector::builder(cfg.clone(), Mock::default()).build().unwrap();
    let b = Reconnector::builder(cfg, Mock::default()).build().unwrap();

    assert!(a.name().starts_with("rs-"));
    assert_eq!(a.name(), b.name());
    a.shutdown().await;
    b.shutdown().await;
}

struct StateLog {
    seen: Arc<Mutex<Vec<ConnectionState>>>,
}

#[async_trait]
impl Subscribe for StateLog {
    async fn on_event(&self, ev: &Event) {
        if let (EventKind::StateChanged, Some(state)) = (ev.kind, ev.state) {
            self.seen.lock().unwrap().push(state);
        }
    }

    fn name(&self) -> &'static str {
        "state-log"
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_transition_before_shutdown_returns() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mock = Mock::new(vec![Step::Open]);
    let rc = Reconnector::builder(config(None), mock.clone())
        .with_subscriber(Arc::new(StateLog { seen: seen.clone() }))
        .build()
        .unwrap();

    rc.start().await.unwrap();
    wait_state(&rc, ConnectionState::Opened).await;
    rc.shutdown().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ConnectionState::Opening,
            ConnectionState::Opened,
            ConnectionState::Closing,
            ConnectionState::Stopped,
        ]
    );
}

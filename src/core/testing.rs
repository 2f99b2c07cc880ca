//! Scripted hooks shared by the lifecycle and reconnector tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};

use crate::core::lifecycle::Lifecycle;
use crate::core::link::{Command, Link};
use crate::core::scheduler::BackoffScheduler;
use crate::core::ConnectionState;
use crate::error::ReconnectError;
use crate::events::Bus;
use crate::hooks::Hooks;
use crate::policies::{BackoffPolicy, BackoffStrategy};

/// What a created handle does right away.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Step {
    /// Reports `opened`.
    Open,
    /// Reports `error(msg)` then `closed`.
    Fail(&'static str),
    /// Reports nothing.
    Pending,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct MockError(pub(crate) &'static str);

#[derive(Default)]
struct Record {
    script: VecDeque<Step>,
    creates: Vec<bool>,
    opens: Vec<bool>,
    closes: usize,
    destroys: usize,
    fails: Vec<String>,
    live: usize,
    max_live: usize,
    last_link: Option<Link>,
}

/// Clonable recording hooks; clones share the same record.
#[derive(Clone, Default)]
pub(crate) struct Mock {
    record: Arc<Mutex<Record>>,
}

pub(crate) struct MockHandle {
    record: Arc<Mutex<Record>>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        lock(&self.record).live -= 1;
    }
}

fn lock(record: &Mutex<Record>) -> MutexGuard<'_, Record> {
    record.lock().unwrap_or_else(|p| p.into_inner())
}

impl Mock {
    pub(crate) fn new(script: Vec<Step>) -> Self {
        let mock = Self::default();
        lock(&mock.record).script = script.into();
        mock
    }

    pub(crate) fn creates(&self) -> Vec<bool> {
        lock(&self.record).creates.clone()
    }

    pub(crate) fn opens(&self) -> Vec<bool> {
        lock(&self.record).opens.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        lock(&self.record).closes
    }

    pub(crate) fn destroys(&self) -> usize {
        lock(&self.record).destroys
    }

    pub(crate) fn fails(&self) -> Vec<String> {
        lock(&self.record).fails.clone()
    }

    pub(crate) fn live(&self) -> usize {
        lock(&self.record).live
    }

    pub(crate) fn max_live(&self) -> usize {
        lock(&self.record).max_live
    }

    pub(crate) fn last_link(&self) -> Link {
        lock(&self.record)
            .last_link
            .clone()
            .expect("no handle was created")
    }

    /// Makes the most recent handle report `closed`.
    pub(crate) fn close_live(&self) {
        self.last_link().closed();
    }

    /// Makes the most recent handle report an error.
    pub(crate) fn error_live(&self, msg: &'static str) {
        self.last_link().error(MockError(msg));
    }
}

impl Hooks for Mock {
    type Handle = MockHandle;

    fn create(&mut self, link: Link, first_open: bool) -> MockHandle {
        let step = {
            let mut r = lock(&self.record);
            r.creates.push(first_open);
            r.live += 1;
            r.max_live = r.max_live.max(r.live);
            r.last_link = Some(link.clone());
            r.script.pop_front().unwrap_or(Step::Pending)
        };
        match step {
            Step::Open => link.opened(),
            Step::Fail(msg) => {
                link.error(MockError(msg));
                link.closed();
            }
            Step::Pending => {}
        }
        MockHandle {
            record: Arc::clone(&self.record),
        }
    }

    fn destroy(&mut self, handle: MockHandle) {
        lock(&self.record).destroys += 1;
        drop(handle);
    }

    fn on_open(&mut self, _handle: &mut MockHandle, first_open: bool) {
        lock(&self.record).opens.push(first_open);
    }

    fn on_close(&mut self, _handle: &mut MockHandle) {
        lock(&self.record).closes += 1;
    }

    fn on_fail(&mut self, err: &ReconnectError) {
        lock(&self.record).fails.push(err.as_message());
    }
}

/// Fibonacci from 100ms, capped at 1s, no jitter.
pub(crate) fn test_policy(fail_after: Option<u32>) -> BackoffPolicy {
    BackoffPolicy {
        strategy: BackoffStrategy::Fibonacci,
        initial: Duration::from_millis(100),
        max: Duration::from_secs(1),
        randomization_factor: 0.0,
        fail_after,
    }
}

/// A lifecycle over a scripted [`Mock`], plus the queue its links report into.
pub(crate) fn lifecycle(
    script: Vec<Step>,
    fail_after: Option<u32>,
) -> (Lifecycle<Mock>, mpsc::UnboundedReceiver<Command>, Bus) {
    let bus = Bus::new(256);
    let (state_tx, _) = watch::channel(ConnectionState::Stopped);
    let (tx, rx) = mpsc::unbounded_channel();
    let lc = Lifecycle::new(
        Arc::from("test"),
        Mock::new(script),
        BackoffScheduler::new(test_policy(fail_after), StdRng::seed_from_u64(7)),
        bus.clone(),
        state_tx,
        tx,
    );
    (lc, rx, bus)
}

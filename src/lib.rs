//! # redial
//!
//! **redial** keeps one caller-defined connection alive.
//!
//! You describe *how* to create and destroy a handle (a socket wrapper, a
//! client, a spawned task) through [`Hooks`]; the [`Reconnector`] decides *when*:
//! it creates the handle on `start()`, recreates it after every close with a
//! fibonacci or exponential backoff, and gives up after a configurable number
//! of consecutive failures.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  transport (your code)                         application
//!   link.opened() / error() / closed()            start() / stop() / state()
//!            │                                              │
//!            ▼                                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  LifecycleActor (one tokio task)                                  │
//! │   select! biased: shutdown ─► commands + link signals ─► timer    │
//! │                                                                   │
//! │   Lifecycle (state machine)          BackoffScheduler             │
//! │   - owns the single handle           - attempt counter            │
//! │   - calls Hooks synchronously        - fail_after bound           │
//! │   - ignores stale link epochs        - retry timer (jittered)     │
//! └──────┬───────────────────────────────────────┬────────────────────┘
//!        │ send_replace(state)                   │ publish(Event)
//!        ▼                                       ▼
//!  watch::Receiver<ConnectionState>   ┌──────────────────────────────┐
//!                                     │   Bus (broadcast channel)    │
//!                                     └──────────────┬───────────────┘
//!                                                    ▼
//!                                       subscriber listener ─► SubscriberSet
//!                                                  ┌─────────┼─────────┐
//!                                                  ▼         ▼         ▼
//!                                               worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Stopped ── start ──► Opening ── opened ──► Opened
//!                         │                     │
//!                         └────── closed ───────┤
//!                                               ▼
//!                     backoff.failure() ─┬─ Scheduled ──► Closed ── timer ──► Reopening
//!                                        │                                      │
//!                                        │               opened ◄───────────────┤
//!                                        │               closed ────────────────┘ (again)
//!                                        └─ Exhausted ──► Failed (on_fail, Failed event)
//!
//! stop() from anywhere: [Closing ──►] Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                       |
//! |-------------------|------------------------------------------------------------------|------------------------------------------|
//! | **Hooks**         | Plug in any transport: create/destroy plus open/close/fail hooks.| [`Hooks`], [`HookFn`], [`Link`]          |
//! | **Lifecycle**     | Start, stop and observe the connection state.                    | [`Reconnector`], [`ConnectionState`]     |
//! | **Policies**      | Fibonacci or exponential backoff, jitter, `fail_after`.          | [`BackoffPolicy`], [`BackoffStrategy`]   |
//! | **Subscriber API**| Consume lifecycle events (logging, metrics, alerts).             | [`Subscribe`], [`Event`], [`EventKind`]  |
//! | **Errors**        | Typed errors for exhaustion, configuration and shutdown.         | [`ReconnectError`], [`HandleError`]      |
//! | **Configuration** | Name, backoff, bus capacity and RNG seed.                        | [`Config`]                               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use redial::{BackoffPolicy, Config, ConnectionState, HookFn, Link, Reconnector};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         name: Some("loopback".into()),
//!         backoff: BackoffPolicy {
//!             initial: Duration::from_millis(50),
//!             fail_after: Some(5),
//!             ..BackoffPolicy::fibonacci()
//!         },
//!         ..Config::default()
//!     };
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn redial::Subscribe>> = vec![Arc::new(redial::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn redial::Subscribe>> = Vec::new();
//!
//!     // A transport that connects instantly.
//!     let hooks = HookFn::new(
//!         |link: Link, _first_open| {
//!             link.opened();
//!             link
//!         },
//!         |_link: Link| {},
//!     )
//!     .on_open(|_link, first_open| println!("connected (first={first_open})"));
//!
//!     let rc = Reconnector::builder(cfg, hooks)
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     rc.start().await?;
//!     let mut state = rc.watch_state();
//!     state.wait_for(|s| *s == ConnectionState::Opened).await?;
//!
//!     rc.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod hooks;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Config, ConnectionState, Link, Reconnector, ReconnectorBuilder};
pub use error::{HandleError, ReconnectError};
pub use events::{Event, EventKind};
pub use hooks::{HookFn, Hooks};
pub use policies::{BackoffPolicy, BackoffStrategy};
pub use subscribers::Subscribe;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

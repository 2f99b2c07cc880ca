//! Reconnector events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the lifecycle and the subscriber
//! workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::lifecycle::Lifecycle` (info/state/failed),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Reconnector::subscribe()` receivers and the subscriber
//!   listener spawned by the builder (fans out to `SubscriberSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

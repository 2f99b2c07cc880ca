//! Runtime core: the lifecycle state machine and the actor that drives it.
//!
//! The public API from this module is [`Reconnector`] (built with
//! [`ReconnectorBuilder`] from a [`Config`]), the [`Link`] handed to hooks, and
//! [`ConnectionState`].
//!
//! Internal modules:
//! - [`lifecycle`]: synchronous state machine; owns the handle and calls hooks;
//! - [`scheduler`]: attempt counter, `fail_after` bound and the retry timer;
//! - [`actor`]: tokio task serializing commands, link signals and timer expiry;
//! - [`link`]: epoch-tagged callbacks from a handle back into the actor.

mod actor;
mod builder;
mod config;
mod lifecycle;
mod link;
mod reconnector;
mod scheduler;
mod state;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use builder::ReconnectorBuilder;
pub use config::Config;
pub use link::Link;
pub use reconnector::Reconnector;
pub use state::ConnectionState;

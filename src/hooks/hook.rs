//! # Hook contract between the reconnector and a transport.
//!
//! The reconnector decides *when* a handle is created or destroyed; a [`Hooks`]
//! implementation decides *how*. All methods are called synchronously from the
//! reconnector's actor task, one at a time, so an implementation can keep
//! plain mutable state in `self`.

use crate::core::Link;
use crate::error::ReconnectError;

/// Caller-supplied lifecycle hooks for one kind of transport.
///
/// `create` and `destroy` are required; the notification hooks default to no-ops.
///
/// # Example
/// ```
/// use redial::{Hooks, Link};
///
/// struct Loopback;
///
/// impl Hooks for Loopback {
///     type Handle = Link;
///
///     fn create(&mut self, link: Link, _first_open: bool) -> Link {
///         // A real transport would start connecting here and report later.
///         link.opened();
///         link
///     }
///
///     fn destroy(&mut self, _handle: Link) {}
///
///     fn on_open(&mut self, _handle: &mut Link, first_open: bool) {
///         println!("connected (first={first_open})");
///     }
/// }
/// ```
pub trait Hooks: Send + 'static {
    /// The resource being kept alive (socket wrapper, task handle, ...).
    type Handle: Send + 'static;

    /// Starts a new handle and returns it without blocking.
    ///
    /// The implementation must arrange for the transport to report back through
    /// `link`: [`Link::opened`] once connected, [`Link::closed`] when it dies
    /// (including a failed connect), [`Link::error`] for errors along the way.
    fn create(&mut self, link: Link, first_open: bool) -> Self::Handle;

    /// Releases the handle's resources.
    ///
    /// Never called twice for the same handle.
    fn destroy(&mut self, handle: Self::Handle);

    /// Called when the handle reports it is open, before the `Opened` state is published.
    ///
    /// `first_open` is true only for the first successful open after `start()`.
    fn on_open(&mut self, handle: &mut Self::Handle, first_open: bool) {
        let _ = (handle, first_open);
    }

    /// Called when the handle reports it closed, right before it is dropped.
    fn on_close(&mut self, handle: &mut Self::Handle) {
        let _ = handle;
    }

    /// Called exactly once per failure episode, after the `Failed` state is published.
    fn on_fail(&mut self, err: &ReconnectError) {
        let _ = err;
    }
}

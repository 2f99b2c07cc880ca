//! # Closure-backed hooks (`HookFn`)
//!
//! [`HookFn`] builds a [`Hooks`] implementation out of closures. The required
//! capabilities (`create`, `destroy`) are constructor arguments; the optional
//! ones are set with builder methods and stay `None` otherwise.
//!
//! ## Example
//! ```rust
//! use redial::{HookFn, Link};
//!
//! let hooks = HookFn::new(
//!     |link: Link, _first_open| {
//!         link.opened();
//!         link
//!     },
//!     |_handle: Link| {},
//! )
//! .on_open(|_handle, first_open| println!("open, first={first_open}"))
//! .on_fail(|err| eprintln!("giving up: {err}"));
//! # let _ = hooks;
//! ```

use std::fmt;

use crate::core::Link;
use crate::error::ReconnectError;
use crate::hooks::hook::Hooks;

type CreateFn<T> = Box<dyn FnMut(Link, bool) -> T + Send>;
type DestroyFn<T> = Box<dyn FnMut(T) + Send>;
type OpenFn<T> = Box<dyn FnMut(&mut T, bool) + Send>;
type CloseFn<T> = Box<dyn FnMut(&mut T) + Send>;
type FailFn = Box<dyn FnMut(&ReconnectError) + Send>;

/// Function-backed hooks.
pub struct HookFn<T> {
    create: CreateFn<T>,
    destroy: DestroyFn<T>,
    on_open: Option<OpenFn<T>>,
    on_close: Option<CloseFn<T>>,
    on_fail: Option<FailFn>,
}

impl<T: Send + 'static> HookFn<T> {
    /// Creates hooks from the two required closures.
    pub fn new<C, D>(create: C, destroy: D) -> Self
    where
        C: FnMut(Link, bool) -> T + Send + 'static,
        D: FnMut(T) + Send + 'static,
    {
        Self {
            create: Box::new(create),
            destroy: Box::new(destroy),
            on_open: None,
            on_close: None,
            on_fail: None,
        }
    }

    /// Sets the hook run when the handle opens.
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut T, bool) + Send + 'static,
    {
        self.on_open = Some(Box::new(f));
        self
    }

    /// Sets the hook run when the handle closes.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut T) + Send + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Sets the hook run when backoff is exhausted.
    pub fn on_fail<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ReconnectError) + Send + 'static,
    {
        self.on_fail = Some(Box::new(f));
        self
    }
}

impl<T: Send + 'static> Hooks for HookFn<T> {
    type Handle = T;

    fn create(&mut self, link: Link, first_open: bool) -> T {
        (self.create)(link, first_open)
    }

    fn destroy(&mut self, handle: T) {
        (self.destroy)(handle)
    }

    fn on_open(&mut self, handle: &mut T, first_open: bool) {
        if let Some(f) = self.on_open.as_mut() {
            f(handle, first_open);
        }
    }

    fn on_close(&mut self, handle: &mut T) {
        if let Some(f) = self.on_close.as_mut() {
            f(handle);
        }
    }

    fn on_fail(&mut self, err: &ReconnectError) {
        if let Some(f) = self.on_fail.as_mut() {
            f(err);
        }
    }
}

impl<T> fmt::Debug for HookFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookFn")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn optional_hooks_default_to_noop() {
        let (link, _rx) = Link::detached();
        let mut hooks = HookFn::new(|_link: Link, first: bool| first, |_h: bool| {});

        let mut handle = hooks.create(link, true);
        assert!(handle);
        Hooks::on_open(&mut hooks, &mut handle, true);
        Hooks::on_close(&mut hooks, &mut handle);
        Hooks::on_fail(&mut hooks, &ReconnectError::Closed);
        hooks.destroy(handle);
    }

    #[test]
    fn closures_receive_arguments() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let (l1, l2, l3, l4) = (log.clone(), log.clone(), log.clone(), log.clone());

        let mut hooks = HookFn::new(
            move |_link: Link, first| {
                l1.lock().unwrap().push(format!("create first={first}"));
                7u32
            },
            move |h: u32| l2.lock().unwrap().push(format!("destroy {h}")),
        )
        .on_open(move |h, first| l3.lock().unwrap().push(format!("open {h} first={first}")))
        .on_fail(move |err| l4.lock().unwrap().push(format!("fail {}", err.as_label())));

        let (link, _rx) = Link::detached();
        let mut h = hooks.create(link, false);
        Hooks::on_open(&mut hooks, &mut h, false);
        Hooks::on_fail(&mut hooks, &ReconnectError::Closed);
        hooks.destroy(h);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "create first=false",
                "open 7 first=false",
                "fail closed",
                "destroy 7"
            ]
        );
        assert!(format!("{hooks:?}").contains("on_close: false"));
    }
}

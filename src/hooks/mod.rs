//! # Hook abstractions.
//!
//! This module provides the caller-facing strategy types:
//! - [`Hooks`] - trait with the required `create`/`destroy` and optional notifications
//! - [`HookFn`] - closure-backed implementation for quick wiring

mod hook;
mod hook_fn;

pub use hook::Hooks;
pub use hook_fn::HookFn;

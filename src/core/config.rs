//! # Reconnector configuration.
//!
//! Provides [`Config`], the settings of one [`Reconnector`](crate::Reconnector).
//!
//! ## Sentinel values
//! - `name = None`  → a random `rs-xxxx` name drawn from the instance RNG
//! - `seed = None`  → RNG seeded from the OS (non-reproducible jitter and naming)
//! - `bus_capacity = 0` → clamped to 1

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ReconnectError;
use crate::policies::BackoffPolicy;

/// Configuration for a reconnector.
///
/// ## Field semantics
/// - `name`: label attached to every event (`None` = random)
/// - `backoff`: delay curve, jitter and `fail_after` bound
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `seed`: makes jitter and the generated name reproducible
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use redial::{BackoffPolicy, Config};
///
/// let cfg = Config {
///     name: Some("upstream".into()),
///     backoff: BackoffPolicy {
///         initial: Duration::from_millis(250),
///         fail_after: Some(5),
///         ..BackoffPolicy::exponential()
///     },
///     ..Config::default()
/// };
/// assert_eq!(cfg.bus_capacity_clamped(), 1024);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Instance name used in events and logs.
    pub name: Option<String>,

    /// Backoff policy for reconnect attempts.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events skip older
    /// items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Seed for the instance RNG (jitter and generated name).
    pub seed: Option<u64>,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    pub(crate) fn validate(&self) -> Result<(), ReconnectError> {
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(ReconnectError::invalid_config("name must not be blank"));
        }
        self.backoff.validate()
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// The configured name, or a generated one.
    pub(crate) fn resolve_name<R: Rng + ?Sized>(&self, rng: &mut R) -> Arc<str> {
        match &self.name {
            Some(name) => Arc::from(name.as_str()),
            None => Arc::from(format!("rs-{:04x}", rng.random::<u16>())),
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = None` (random)
    /// - `backoff = BackoffPolicy::default()` (fibonacci, 1s..20s, factor 0.2, unbounded)
    /// - `bus_capacity = 1024`
    /// - `seed = None`
    fn default() -> Self {
        Self {
            name: None,
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
            seed: None,
        }
    }
}

//! # Jitter for reconnect delays.
//!
//! Moves a backoff delay by a random share of itself, in either direction, so
//! that many clients losing the same server do not retry in lockstep:
//!
//! ```text
//! jittered = round(delay × (1 + factor × U[-1, 1)))      (milliseconds)
//! ```
//!
//! With `factor < 1` the result stays within `delay × (1 ± factor)`.

use std::time::Duration;

use rand::Rng;

/// Applies proportional jitter to `delay`.
///
/// A non-positive `factor` or a zero delay returns the input unchanged.
pub(crate) fn randomize<R: Rng + ?Sized>(delay: Duration, factor: f64, rng: &mut R) -> Duration {
    if factor <= 0.0 || delay.is_zero() {
        return delay;
    }
    let ms = delay.as_millis() as f64;
    let multiple = 1.0 + rng.random_range(-1.0..1.0) * factor;
    let jittered = (ms * multiple).round();

    if jittered.is_finite() && jittered >= 0.0 && jittered < u64::MAX as f64 {
        Duration::from_millis(jittered as u64)
    } else {
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_factor_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = Duration::from_millis(1234);
        assert_eq!(randomize(d, 0.0, &mut rng), d);
    }

    #[test]
    fn zero_delay_stays_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(randomize(Duration::ZERO, 0.9, &mut rng), Duration::ZERO);
    }

    #[test]
    fn same_seed_same_sequence() {
        let d = Duration::from_secs(2);
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(randomize(d, 0.2, &mut a), randomize(d, 0.2, &mut b));
        }
    }

    #[test]
    fn stays_within_factor_both_ways() {
        let mut rng = StdRng::seed_from_u64(9);
        let d = Duration::from_millis(1000);
        let (mut below, mut above) = (false, false);
        for _ in 0..500 {
            let j = randomize(d, 0.2, &mut rng);
            assert!(j >= Duration::from_millis(800));
            assert!(j <= Duration::from_millis(1200));
            below |= j < d;
            above |= j > d;
        }
        assert!(below && above);
    }
}

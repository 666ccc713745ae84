//! Deterministic seeded random numbers.
//!
//! A Park–Miller multiplicative congruential generator: one integer register,
//! `state = state * 16807 mod (2^31 - 1)`. Two generators created from the
//! same seed produce bit-identical sequences, which is what makes graph
//! builds and synthetic training runs reproducible.
//!
//! A fresh generator is created for every build and discarded afterwards;
//! nothing in the crate keeps a global generator.

use rand::Rng;

/// Modulus of the generator (the Mersenne prime 2^31 - 1).
pub const MODULUS: u64 = 2_147_483_647;

/// Multiplier of the generator.
pub const MULTIPLIER: u64 = 16_807;

/// Seed used whenever the supplied one is missing, non-finite, out of range
/// or reduces to zero.
pub const DEFAULT_SEED: u32 = 1337;

/// Largest magnitude accepted as a seed before falling back to the default.
const MAX_SEED_MAGNITUDE: f64 = 9_007_199_254_740_991.0; // 2^53 - 1

/// Coerce an arbitrary seed value into a valid generator state.
///
/// Missing, NaN, infinite and out-of-range values map to [`DEFAULT_SEED`].
/// Otherwise the integer part of the magnitude is reduced modulo
/// [`MODULUS`]; a zero result also maps to the default.
///
/// ```
/// use neural_scene::rng::{sanitize_seed, DEFAULT_SEED};
///
/// assert_eq!(sanitize_seed(None), DEFAULT_SEED);
/// assert_eq!(sanitize_seed(Some(f64::NAN)), DEFAULT_SEED);
/// assert_eq!(sanitize_seed(Some(0.0)), DEFAULT_SEED);
/// assert_eq!(sanitize_seed(Some(-100.0)), 100);
/// ```
pub fn sanitize_seed(seed: Option<f64>) -> u32 {
    let Some(seed) = seed else {
        return DEFAULT_SEED;
    };
    if !seed.is_finite() {
        return DEFAULT_SEED;
    }

    let magnitude = seed.abs().trunc();
    if magnitude > MAX_SEED_MAGNITUDE {
        return DEFAULT_SEED;
    }

    let reduced = (magnitude as u64) % MODULUS;
    if reduced == 0 {
        DEFAULT_SEED
    } else {
        reduced as u32
    }
}

/// Pick a fresh non-zero seed from the thread-local entropy source.
///
/// Used when a caller has no persisted seed; the returned value should be
/// stored so the build can be reproduced later.
pub fn fresh_seed() -> u32 {
    rand::thread_rng().gen_range(1..MODULUS as u32)
}

/// Deterministic uniform generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    /// Create a generator; the seed is sanitized first.
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(sanitize_seed(Some(f64::from(seed)))),
        }
    }

    /// Create a generator from an unsanitized seed value.
    pub fn from_raw(seed: Option<f64>) -> Self {
        Self {
            state: u64::from(sanitize_seed(seed)),
        }
    }

    /// Current register value.
    pub fn state(&self) -> u32 {
        self.state as u32
    }

    /// Advance the register and return `(state - 1) / (M - 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER) % MODULUS;
        (self.state - 1) as f64 / (MODULUS - 1) as f64
    }

    /// Borrow the generator as a `FnMut() -> f64` source.
    pub fn as_source(&mut self) -> impl FnMut() -> f64 + '_ {
        move || self.next_f64()
    }
}

/// Build a closure-style generator from a seed.
///
/// Equivalent to `SeededRandom::from_raw(seed)` moved into a closure.
pub fn create_generator(seed: Option<f64>) -> impl FnMut() -> f64 {
    let mut rng = SeededRandom::from_raw(seed);
    move || rng.next_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_defaults() {
        assert_eq!(sanitize_seed(None), DEFAULT_SEED);
        assert_eq!(sanitize_seed(Some(f64::NAN)), DEFAULT_SEED);
        assert_eq!(sanitize_seed(Some(f64::INFINITY)), DEFAULT_SEED);
        assert_eq!(sanitize_seed(Some(0.0)), DEFAULT_SEED);
        assert_eq!(sanitize_seed(Some(1e300)), DEFAULT_SEED);
    }

    #[test]
    fn test_sanitize_reduces_magnitude() {
        assert_eq!(sanitize_seed(Some(-100.0)), 100);
        assert_eq!(sanitize_seed(Some(42.9)), 42);
        assert_eq!(sanitize_seed(Some(MODULUS as f64 + 5.0)), 5);
        // Exact multiple of the modulus reduces to zero.
        assert_eq!(sanitize_seed(Some(MODULUS as f64)), DEFAULT_SEED);
    }

    #[test]
    fn test_equal_seeds_equal_sequences() {
        let mut a = SeededRandom::new(2024);
        let mut b = SeededRandom::new(2024);
        for _ in 0..16 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_closure_matches_struct() {
        let mut gen = create_generator(Some(7.0));
        let mut rng = SeededRandom::new(7);
        for _ in 0..8 {
            assert_eq!(gen().to_bits(), rng.next_f64().to_bits());
        }
    }

    #[test]
    fn test_known_first_value() {
        // 1 * 16807 mod M = 16807
        let mut rng = SeededRandom::new(1);
        let v = rng.next_f64();
        assert_eq!(rng.state(), 16_807);
        assert!((v - 16_806.0 / (MODULUS - 1) as f64).abs() < 1e-15);
    }

    #[test]
    fn test_unit_interval() {
        let mut rng = SeededRandom::new(99);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_fresh_seed_nonzero() {
        for _ in 0..32 {
            let seed = fresh_seed();
            assert!(seed > 0 && u64::from(seed) < MODULUS);
        }
    }
}

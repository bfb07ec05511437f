//! Randomness and distribution primitives
//!
//! Every statistical algorithm in the engine draws from a [`RandomSource`]
//! rather than ambient RNG state, so each can be driven deterministically in
//! tests. The distribution helpers are closed forms over the uniform draw:
//! inverse-CDF exponential, Box-Muller normal, and the Erlang-2 shortcut
//! for gamma.

use rand::Rng;

/// Uniform random source, the single seam between the engine's statistics
/// and actual entropy.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic source replaying a fixed sequence, cycling when exhausted.
///
/// Intended for tests that pin every draw; an empty sequence yields 0.0.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    index: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }

    /// A source that answers every draw with the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value
    }
}

/// Exponential draw with the given mean: `-ln(1 - U) * mean`.
pub fn exponential(rng: &mut dyn RandomSource, mean: f64) -> f64 {
    -(1.0 - rng.next_f64()).ln() * mean
}

/// Normal draw via the Box-Muller transform.
pub fn normal(rng: &mut dyn RandomSource, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.next_f64().max(f64::MIN_POSITIVE);
    let u2 = rng.next_f64();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev + mean
}

/// Gamma draw with integer shape.
///
/// Shape 2 is the Erlang-2 closed form `-scale * (ln U1 + ln U2)`; other
/// shapes fall back to a sum of unit-mean exponential draws.
pub fn gamma(rng: &mut dyn RandomSource, shape: u32, scale: f64) -> f64 {
    if shape == 2 {
        let u1 = rng.next_f64().max(f64::MIN_POSITIVE);
        let u2 = rng.next_f64().max(f64::MIN_POSITIVE);
        return -scale * (u1.ln() + u2.ln());
    }

    let mut sum = 0.0;
    for _ in 0..shape {
        sum += exponential(rng, 1.0);
    }
    sum * scale
}

/// Uniform draw in `[low, high)`.
pub fn uniform_range(rng: &mut dyn RandomSource, low: f64, high: f64) -> f64 {
    low + rng.next_f64() * (high - low)
}

/// Bernoulli draw with success probability `p`.
pub fn chance(rng: &mut dyn RandomSource, p: f64) -> bool {
    rng.next_f64() < p
}

/// Uniform index into a collection of `len` elements.
///
/// `len` must be nonzero; the draw in `[0, 1)` keeps the result in bounds.
pub fn pick_index(rng: &mut dyn RandomSource, len: usize) -> usize {
    debug_assert!(len > 0);
    let index = (rng.next_f64() * len as f64) as usize;
    index.min(len - 1)
}

/// Uniformly chosen element of a nonempty slice.
pub fn pick<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> &'a T {
    &items[pick_index(rng, items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_matches_closed_form_at_half() {
        let mut rng = SequenceSource::constant(0.5);
        let sample = exponential(&mut rng, 180_000.0);
        assert!((sample - 180_000.0 * std::f64::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn erlang_two_matches_closed_form_at_half() {
        let mut rng = SequenceSource::constant(0.5);
        let sample = gamma(&mut rng, 2, 1_800_000.0);
        let expected = -2.0 * 1_800_000.0 * 0.5_f64.ln();
        assert!((sample - expected).abs() < 1e-6);
    }

    #[test]
    fn normal_follows_box_muller_closed_form() {
        // u2 = 0.5 puts the angle at pi, so z0 = -sqrt(-2 ln u1).
        let mut rng = SequenceSource::new(vec![0.5, 0.5]);
        let sample = normal(&mut rng, 10.0, 2.0);
        let z0 = -(2.0 * std::f64::consts::LN_2).sqrt();
        assert!((sample - (10.0 + 2.0 * z0)).abs() < 1e-9);
    }

    #[test]
    fn gamma_general_shape_sums_exponentials() {
        let mut rng = SequenceSource::constant(0.5);
        let sample = gamma(&mut rng, 3, 10.0);
        let expected = 3.0 * std::f64::consts::LN_2 * 10.0;
        assert!((sample - expected).abs() < 1e-6);
    }

    #[test]
    fn pick_index_never_leaves_bounds() {
        let mut rng = SequenceSource::new(vec![0.0, 0.25, 0.5, 0.999_999]);
        for _ in 0..8 {
            assert!(pick_index(&mut rng, 4) < 4);
        }
    }

    #[test]
    fn exponential_mean_close_to_parameter() {
        let mut rng = ThreadRngSource;
        let n = 10_000;
        let mut acc = 0.0;
        for _ in 0..n {
            acc += exponential(&mut rng, 0.1);
        }
        let mean = acc / f64::from(n);
        // Expected mean 0.1, allow generous tolerance
        assert!((mean - 0.1).abs() < 0.02);
    }
}

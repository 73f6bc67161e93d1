//! Raw chiptune sources: a naive (non band-limited) square and white noise.
//!
//! Aliasing is part of the sound here, so there is no PolyBLEP correction.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Supported source shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Square,
    Noise,
}

/// Sign of `x` with `sign(0) == 0`. `f64::signum` maps zero to one, which
/// would put a DC click at every zero crossing of the phase.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Square wave value at absolute time `t` seconds, in {-1, 0, 1}.
///
/// Phase is taken from the buffer clock rather than the note start, so
/// overlapping notes of the same pitch stay phase-aligned.
pub fn square(frequency: f64, t: f64) -> f64 {
    sign((TAU * frequency * t).sin())
}

/// Seeded white-noise source producing uniform values in [-1, 1).
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: Pcg32,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        NoiseSource {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        self.rng.random_range(-1.0..1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_zero_at_start() {
        assert_eq!(square(440.0, 0.0), 0.0);
    }

    #[test]
    fn square_levels() {
        let sr = 22050.0;
        for i in 1..22050 {
            let s = square(110.0, i as f64 / sr);
            assert!(s == 1.0 || s == -1.0 || s == 0.0, "Square out of range: {s}");
        }
    }

    #[test]
    fn square_half_cycles() {
        // 1 Hz: positive in the first half second, negative in the second.
        assert_eq!(square(1.0, 0.25), 1.0);
        assert_eq!(square(1.0, 0.75), -1.0);
    }

    #[test]
    fn noise_range() {
        let mut noise = NoiseSource::new(7);
        for _ in 0..44100 {
            let s = noise.next_sample();
            assert!((-1.0..1.0).contains(&s), "Noise out of range: {s}");
        }
    }

    #[test]
    fn noise_is_reproducible() {
        let mut a = NoiseSource::new(42);
        let mut b = NoiseSource::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn noise_seeds_differ() {
        let mut a = NoiseSource::new(1);
        let mut b = NoiseSource::new(2);
        let same = (0..64).all(|_| a.next_sample() == b.next_sample());
        assert!(!same, "Different seeds should give different noise");
    }
}

//! Mixer — a buffer-wide soft limiter.
//!
//! One gain scalar is derived from the peak of the whole mix and applied
//! uniformly at encode time. No per-voice or per-band dynamics.

/// Floor for the observed peak so a silent buffer does not divide by zero.
const PEAK_EPSILON: f64 = 1e-9;

/// Global gain computed from a buffer's peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter {
    pub target_peak: f64,
    pub observed_peak: f64,
    pub gain: f64,
}

impl Limiter {
    /// Scan `samples` for their absolute peak and derive the gain that
    /// brings it to `target_peak`.
    pub fn analyze(samples: &[f64], target_peak: f64) -> Self {
        let observed_peak = peak(samples);
        Limiter {
            target_peak,
            observed_peak,
            gain: target_peak / observed_peak.max(PEAK_EPSILON),
        }
    }

    /// Apply the gain and hard-limit to [-1, 1].
    pub fn apply(&self, sample: f64) -> f64 {
        (sample * self.gain).clamp(-1.0, 1.0)
    }
}

/// Largest absolute sample value.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |m, &s| m.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_peak_to_target() {
        let limiter = Limiter::analyze(&[0.2, -1.7, 0.5], 0.85);
        assert!((limiter.observed_peak - 1.7).abs() < 1e-12);
        assert!((limiter.apply(-1.7) + 0.85).abs() < 1e-12);
        assert!((limiter.apply(0.2) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn quiet_mix_is_boosted() {
        let limiter = Limiter::analyze(&[0.1, -0.05], 0.85);
        assert!(limiter.gain > 1.0);
        assert!((limiter.apply(0.1) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn silence_stays_silent() {
        let limiter = Limiter::analyze(&[0.0; 64], 0.85);
        assert!(limiter.gain.is_finite());
        assert_eq!(limiter.apply(0.0), 0.0);
    }

    #[test]
    fn apply_never_exceeds_unity() {
        let limiter = Limiter::analyze(&[0.5], 0.85);
        assert_eq!(limiter.apply(100.0), 1.0);
        assert_eq!(limiter.apply(-100.0), -1.0);
    }
}

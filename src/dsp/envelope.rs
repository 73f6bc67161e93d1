//! Amplitude envelopes — piecewise ADSR for tones, exponential decay for noise.
//!
//! Both are pure functions of time since note start.

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,
    /// Past the end of the note.
    Idle,
}

/// Default segment ceilings in seconds and sustain level.
const MAX_ATTACK: f64 = 0.01;
const MAX_DECAY: f64 = 0.08;
const MAX_RELEASE: f64 = 0.04;
const SUSTAIN: f64 = 0.7;

/// ADSR envelope with linear attack/decay/release ramps, sized for one note.
#[derive(Debug, Clone, PartialEq)]
pub struct Adsr {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
    /// Total note length in seconds, release included.
    pub duration: f64,
}

impl Adsr {
    /// Build the envelope for a note of `duration` seconds.
    ///
    /// Attack, decay and release are capped to 20%, 30% and 20% of the note
    /// so that short notes never produce negative segment lengths.
    pub fn for_note(duration: f64) -> Self {
        let duration = duration.max(0.0);
        Adsr {
            attack: MAX_ATTACK.min(duration * 0.2),
            decay: MAX_DECAY.min(duration * 0.3),
            sustain: SUSTAIN,
            release: MAX_RELEASE.min(duration * 0.2),
            duration,
        }
    }

    /// Which stage the envelope is in at `t` seconds after note start.
    pub fn stage_at(&self, t: f64) -> Stage {
        if t < 0.0 || t >= self.duration {
            Stage::Idle
        } else if t < self.attack {
            Stage::Attack
        } else if t < self.attack + self.decay {
            Stage::Decay
        } else if t < self.duration - self.release {
            Stage::Sustain
        } else {
            Stage::Release
        }
    }

    /// Envelope level [0, 1] at `t` seconds after note start.
    pub fn level_at(&self, t: f64) -> f64 {
        match self.stage_at(t) {
            Stage::Idle => 0.0,
            Stage::Attack => t / self.attack,
            Stage::Decay => 1.0 - (1.0 - self.sustain) * ((t - self.attack) / self.decay),
            Stage::Sustain => self.sustain,
            Stage::Release => {
                if self.release <= 0.0 {
                    return 0.0;
                }
                let into = t - (self.duration - self.release);
                (self.sustain * (1.0 - into / self.release)).max(0.0)
            }
        }
    }
}

/// Exponential decay `exp(-k·t)` for percussive noise.
pub fn noise_decay(t: f64, k: f64) -> f64 {
    (-k * t).exp()
}

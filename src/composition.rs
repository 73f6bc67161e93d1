//! The fixed background-loop composition.
//!
//! Everything the synthesizer needs to know about the music lives here as
//! `const` data: tempo, the chord cycle, and how each voice sounds.

/// A triad given as raw frequencies in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    pub root: f64,
    pub third: f64,
    pub fifth: f64,
}

impl Chord {
    pub const fn new(root: f64, third: f64, fifth: f64) -> Self {
        Chord { root, third, fifth }
    }

    /// Arpeggio pattern (root, third, fifth, third) shifted up `octaves`.
    pub fn arpeggio(&self, octaves: u32) -> [f64; 4] {
        let shift = (1u32 << octaves) as f64;
        [
            self.root * shift,
            self.third * shift,
            self.fifth * shift,
            self.third * shift,
        ]
    }
}

/// A square-wave voice with a fixed length in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneVoice {
    pub frequency: f64,
    pub duration: f64,
    pub volume: f64,
}

/// A square-wave voice whose pitch comes from the chord and whose length
/// is a fraction of a beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchedVoice {
    /// Note length as a fraction of one beat.
    pub gate: f64,
    pub volume: f64,
}

/// A white-noise burst with exponential decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseVoice {
    pub duration: f64,
    pub volume: f64,
    /// Decay rate `k` in `exp(-k·t)`.
    pub decay: f64,
    /// Beat offsets within a measure where the burst fires.
    pub beats: &'static [f64],
}

/// An immutable composition. Build-time constant, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition {
    pub beats_per_minute: f64,
    pub beats_per_measure: u32,
    pub chords: &'static [Chord],
    pub kick: ToneVoice,
    pub snare: NoiseVoice,
    pub bass: PitchedVoice,
    pub arp: PitchedVoice,
    /// Octave shift applied to arpeggio chord tones.
    pub arp_octaves: u32,
    /// Arpeggio notes per measure (eighth notes in 4/4).
    pub arp_steps: u32,
    /// Seed for the noise generator so that renders are reproducible.
    pub noise_seed: u64,
}

/// 110 BPM, Am → F → G → Em.
pub const CYBER_GROOVE: Composition = Composition {
    beats_per_minute: 110.0,
    beats_per_measure: 4,
    chords: &[
        Chord::new(110.0, 220.0, 440.0),
        Chord::new(87.31, 174.61, 349.23),
        Chord::new(98.0, 196.0, 392.0),
        Chord::new(82.41, 164.81, 329.63),
    ],
    kick: ToneVoice {
        frequency: 55.0,
        duration: 0.08,
        volume: 0.22,
    },
    snare: NoiseVoice {
        duration: 0.03,
        volume: 0.25,
        decay: 18.0,
        beats: &[1.0, 3.0],
    },
    bass: PitchedVoice {
        gate: 0.46,
        volume: 0.24,
    },
    arp: PitchedVoice {
        gate: 0.45,
        volume: 0.12,
    },
    arp_octaves: 1,
    arp_steps: 8,
    noise_seed: 0x8b17_c0de,
};

impl Composition {
    /// Seconds per beat.
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.beats_per_minute
    }

    /// Seconds per measure.
    pub fn measure_duration(&self) -> f64 {
        self.beat_duration() * self.beats_per_measure as f64
    }

    /// Number of measures needed to cover `seconds`, counting a trailing
    /// partial measure.
    pub fn measure_count(&self, seconds: f64) -> usize {
        (seconds / self.measure_duration()).ceil().max(0.0) as usize
    }

    /// Chord for measure `m`, cycling through the progression.
    pub fn chord_at(&self, measure: usize) -> &Chord {
        &self.chords[measure % self.chords.len()]
    }
}

impl Default for Composition {
    fn default() -> Self {
        CYBER_GROOVE
    }
}

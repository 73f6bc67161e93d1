//! Audio Engine — renders the composition to a mono sample buffer.
//!
//! Rendering happens in two steps: the composition is expanded into a flat
//! list of timed note events, then every event is summed into one shared
//! buffer. Overlapping events simply add; there is no voice stealing.

use crate::composition::Composition;
use crate::error::SynthError;

use super::envelope::{noise_decay, Adsr};
use super::oscillator::{square, NoiseSource, Waveform};

/// Bytes per encoded mono 16-bit sample.
const PCM_BYTES_PER_SAMPLE: u64 = 2;
/// Largest payload whose RIFF size field (payload + 36) fits in 32 bits.
const MAX_PCM_PAYLOAD: u64 = u32::MAX as u64 - 36;

/// Render parameters for the fallback loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub sample_rate: u32,
    pub duration_secs: f64,
    /// Peak level the limiter scales the mix to.
    pub target_peak: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            sample_rate: 22050,
            duration_secs: 6.0,
            target_peak: 0.85,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.sample_rate == 0 || self.sample_rate as u64 * PCM_BYTES_PER_SAMPLE > u32::MAX as u64 {
            return Err(SynthError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(SynthError::InvalidDuration {
                seconds: self.duration_secs,
            });
        }
        if !self.target_peak.is_finite() || self.target_peak <= 0.0 || self.target_peak > 1.0 {
            return Err(SynthError::InvalidTargetPeak {
                peak: self.target_peak,
            });
        }
        // Checked before anything is allocated.
        let bytes = self.payload_bytes();
        if bytes > MAX_PCM_PAYLOAD {
            return Err(SynthError::PayloadTooLarge { bytes });
        }
        Ok(())
    }

    /// Size of the encoded PCM payload, saturating on absurd settings.
    pub fn payload_bytes(&self) -> u64 {
        let samples = (self.sample_rate as f64 * self.duration_secs).round();
        (samples * PCM_BYTES_PER_SAMPLE as f64) as u64
    }

    /// Total number of samples in the rendered buffer.
    pub fn num_samples(&self) -> usize {
        (self.sample_rate as f64 * self.duration_secs).round() as usize
    }
}

/// One scheduled note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    /// Start time in seconds.
    pub start: f64,
    /// Length in seconds.
    pub duration: f64,
    pub waveform: Waveform,
    /// Frequency in Hz (ignored for noise).
    pub frequency: f64,
    pub volume: f64,
}

/// Mono render output at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn silent(sample_rate: u32, len: usize) -> Self {
        SampleBuffer {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample index range `[start, end)` covered by a span of time, clipped
    /// to the buffer.
    fn span(&self, start_secs: f64, duration_secs: f64) -> (usize, usize) {
        let sr = self.sample_rate as f64;
        let start = (start_secs * sr).floor().max(0.0) as usize;
        let end = ((start_secs + duration_secs) * sr).floor().max(0.0) as usize;
        (start.min(self.len()), end.min(self.len()))
    }
}

/// Expand the composition into note events covering `seconds`.
pub fn schedule(composition: &Composition, seconds: f64) -> Vec<NoteEvent> {
    let beat = composition.beat_duration();
    let mut events = Vec::new();

    for m in 0..composition.measure_count(seconds) {
        let chord = composition.chord_at(m);
        let base = m as f64 * composition.measure_duration();

        let kick = composition.kick;
        events.push(NoteEvent {
            start: base,
            duration: kick.duration,
            waveform: Waveform::Square,
            frequency: kick.frequency,
            volume: kick.volume,
        });

        let snare = composition.snare;
        for &offset in snare.beats {
            events.push(NoteEvent {
                start: base + beat * offset,
                duration: snare.duration,
                waveform: Waveform::Noise,
                frequency: 0.0,
                volume: snare.volume,
            });
        }

        for b in 0..composition.beats_per_measure {
            events.push(NoteEvent {
                start: base + b as f64 * beat,
                duration: beat * composition.bass.gate,
                waveform: Waveform::Square,
                frequency: chord.root,
                volume: composition.bass.volume,
            });
        }

        let arp = chord.arpeggio(composition.arp_octaves);
        let step = composition.measure_duration() / composition.arp_steps as f64;
        for e in 0..composition.arp_steps as usize {
            events.push(NoteEvent {
                start: base + e as f64 * step,
                duration: beat * composition.arp.gate,
                waveform: Waveform::Square,
                frequency: arp[e % arp.len()],
                volume: composition.arp.volume,
            });
        }
    }

    events
}

/// Renders a composition into a [`SampleBuffer`].
#[derive(Debug, Clone)]
pub struct AudioEngine {
    pub settings: RenderSettings,
}

impl AudioEngine {
    pub fn new(settings: RenderSettings) -> Self {
        AudioEngine { settings }
    }

    /// Render the composition. Deterministic: the same composition and
    /// settings always give the same buffer.
    pub fn render(&self, composition: &Composition) -> Result<SampleBuffer, SynthError> {
        self.settings.validate()?;

        let mut buffer = SampleBuffer::silent(self.settings.sample_rate, self.settings.num_samples());
        let mut noise = NoiseSource::new(composition.noise_seed);

        let events = schedule(composition, self.settings.duration_secs);
        tracing::debug!(events = events.len(), samples = buffer.len(), "rendering loop");

        for event in &events {
            match event.waveform {
                Waveform::Square => add_square(&mut buffer, event),
                Waveform::Noise => add_noise(&mut buffer, event, composition.snare.decay, &mut noise),
            }
        }

        Ok(buffer)
    }
}

fn add_square(buffer: &mut SampleBuffer, event: &NoteEvent) {
    let sr = buffer.sample_rate as f64;
    let env = Adsr::for_note(event.duration);
    let (start, end) = buffer.span(event.start, event.duration);

    for i in start..end {
        let now = i as f64 / sr;
        let level = env.level_at(now - event.start);
        buffer.samples[i] += square(event.frequency, now) * event.volume * level;
    }
}

fn add_noise(buffer: &mut SampleBuffer, event: &NoteEvent, decay: f64, noise: &mut NoiseSource) {
    let sr = buffer.sample_rate as f64;
    let (start, end) = buffer.span(event.start, event.duration);

    for i in start..end {
        let t = (i - start) as f64 / sr;
        buffer.samples[i] += noise.next_sample() * event.volume * noise_decay(t, decay);
    }
}

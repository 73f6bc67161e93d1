use std::fmt;

#[derive(Debug)]
pub enum ChiploopError {
    Synth(SynthError),
    Audio(AudioError),
}

/// Failures while rendering or encoding the fallback loop.
#[derive(Debug)]
pub enum SynthError {
    InvalidSampleRate { sample_rate: u32 },
    InvalidDuration { seconds: f64 },
    InvalidTargetPeak { peak: f64 },
    /// The PCM payload would not fit the 32-bit RIFF size fields.
    PayloadTooLarge { bytes: u64 },
    Encode(std::io::Error),
}

/// Failures reported by the platform audio element.
#[derive(Debug)]
pub enum AudioError {
    /// The platform refused to start playback (autoplay policy).
    PlayRejected(String),
    /// The element could not be created or driven.
    Unavailable(String),
}

impl fmt::Display for ChiploopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChiploopError::Synth(e) => write!(f, "Synthesis error: {e}"),
            ChiploopError::Audio(e) => write!(f, "Audio error: {e}"),
        }
    }
}

impl std::error::Error for ChiploopError {}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::InvalidSampleRate { sample_rate } => {
                write!(f, "Invalid sample rate {sample_rate} Hz")
            }
            SynthError::InvalidDuration { seconds } => write!(f, "Invalid duration {seconds}s"),
            SynthError::InvalidTargetPeak { peak } => write!(f, "Invalid limiter target peak {peak}"),
            SynthError::PayloadTooLarge { bytes } => {
                write!(f, "PCM payload of {bytes} bytes does not fit a WAV container")
            }
            SynthError::Encode(e) => write!(f, "Base64 encoding failed: {e}"),
        }
    }
}

impl std::error::Error for SynthError {}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::PlayRejected(reason) => write!(f, "Playback rejected: {reason}"),
            AudioError::Unavailable(reason) => write!(f, "Audio unavailable: {reason}"),
        }
    }
}

impl std::error::Error for AudioError {}

impl From<SynthError> for ChiploopError {
    fn from(e: SynthError) -> Self {
        ChiploopError::Synth(e)
    }
}

impl From<AudioError> for ChiploopError {
    fn from(e: AudioError) -> Self {
        ChiploopError::Audio(e)
    }
}

impl From<std::io::Error> for SynthError {
    fn from(e: std::io::Error) -> Self {
        SynthError::Encode(e)
    }
}

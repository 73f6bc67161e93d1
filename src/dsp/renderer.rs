//! WAV renderer — limits, quantizes and packs a buffer into a playable asset.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderStringWriter;

use crate::composition::Composition;
use crate::error::SynthError;

use super::engine::{AudioEngine, RenderSettings, SampleBuffer};
use super::mixer::Limiter;

/// Size of the canonical 44-byte RIFF/WAVE header.
pub const WAV_HEADER_LEN: usize = 44;
/// Bytes fed to the base64 writer per call.
pub const BASE64_CHUNK: usize = 0x8000;
/// Media-type prefix of the data URI.
pub const DATA_URI_PREFIX: &str = "data:audio/wav;base64,";

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// A self-contained WAV file (header + PCM payload). Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAsset {
    bytes: Vec<u8>,
}

impl WavAsset {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode as a directly playable `data:audio/wav;base64,...` URI.
    ///
    /// The bytes are streamed through the encoder in fixed-size chunks; the
    /// writer carries partial 3-byte groups across chunk boundaries so the
    /// output is identical to a single-shot encode.
    pub fn data_uri(&self) -> Result<String, SynthError> {
        let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + self.bytes.len().div_ceil(3) * 4);
        uri.push_str(DATA_URI_PREFIX);
        let mut writer = EncoderStringWriter::from_consumer(uri, &STANDARD);
        for chunk in self.bytes.chunks(BASE64_CHUNK) {
            writer.write_all(chunk)?;
        }
        Ok(writer.into_inner())
    }
}

/// Render the composition and encode it as a mono 16-bit WAV.
pub fn render_wav(composition: &Composition, settings: &RenderSettings) -> Result<WavAsset, SynthError> {
    let buffer = AudioEngine::new(settings.clone()).render(composition)?;
    let limiter = Limiter::analyze(&buffer.samples, settings.target_peak);
    tracing::debug!(
        peak = limiter.observed_peak,
        gain = limiter.gain,
        "limiting loop"
    );
    encode_wav(&buffer, &limiter)
}

/// Render the default loop straight to a data URI.
pub fn render_data_uri(composition: &Composition, settings: &RenderSettings) -> Result<String, SynthError> {
    render_wav(composition, settings)?.data_uri()
}

/// Quantize a limited sample to signed 16-bit.
fn quantize(sample: f64) -> i16 {
    (sample * 32767.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Encode a mono buffer to WAV bytes, applying the limiter gain per sample.
pub fn encode_wav(buffer: &SampleBuffer, limiter: &Limiter) -> Result<WavAsset, SynthError> {
    let bytes_per_sample = BITS_PER_SAMPLE / 8;
    let data_size = buffer.len() as u64 * bytes_per_sample as u64;
    if data_size + 36 > u32::MAX as u64 {
        return Err(SynthError::PayloadTooLarge { bytes: data_size });
    }
    let data_size = data_size as u32;
    let sample_rate = buffer.sample_rate;
    let byte_rate = u32::try_from(sample_rate as u64 * CHANNELS as u64 * bytes_per_sample as u64)
        .map_err(|_| SynthError::InvalidSampleRate { sample_rate })?;
    let block_align = CHANNELS * bytes_per_sample;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&CHANNELS.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in &buffer.samples {
        buf.extend_from_slice(&quantize(limiter.apply(sample)).to_le_bytes());
    }

    Ok(WavAsset { bytes: buf })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::CYBER_GROOVE;
    use base64::Engine;

    fn u16_at(wav: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([wav[at], wav[at + 1]])
    }

    fn u32_at(wav: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([wav[at], wav[at + 1], wav[at + 2], wav[at + 3]])
    }

    fn default_wav() -> WavAsset {
        render_wav(&CYBER_GROOVE, &RenderSettings::default()).expect("render failed")
    }

    #[test]
    fn wav_header_valid() {
        let asset = default_wav();
        let wav = asset.as_bytes();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        assert_eq!(u32_at(wav, 16), 16);
        assert_eq!(u16_at(wav, 20), 1, "PCM format tag");
        assert_eq!(u16_at(wav, 22), 1, "mono");
        assert_eq!(u32_at(wav, 24), 22050);
        assert_eq!(u32_at(wav, 28), 44100, "byte rate");
        assert_eq!(u16_at(wav, 32), 2, "block align");
        assert_eq!(u16_at(wav, 34), 16);
    }

    #[test]
    fn wav_size_correct() {
        let asset = default_wav();
        let wav = asset.as_bytes();

        // 6s at 22050 Hz = 132300 samples * 2 bytes = 264600 data bytes
        assert_eq!(u32_at(wav, 40), 264_600);
        assert_eq!(u32_at(wav, 4), 36 + 264_600);
        assert_eq!(asset.len(), 264_644);
    }

    #[test]
    fn encoding_is_byte_identical_across_runs() {
        assert_eq!(default_wav(), default_wav());
    }

    #[test]
    fn limiter_peak_lands_near_target() {
        let asset = default_wav();
        let max = asset.as_bytes()[WAV_HEADER_LEN..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]).unsigned_abs())
            .max()
            .unwrap_or(0);
        let expected = (0.85f64 * 32767.0).round() as u16;
        assert!(max.abs_diff(expected) <= 1, "Peak {max} should be ~{expected}");
    }

    #[test]
    fn quantize_rounds() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32767);
        assert_eq!(quantize(0.5), 16384);
        assert_eq!(quantize(0.0), 0);
    }

    #[test]
    fn encode_clamps_out_of_range_samples() {
        let buffer = SampleBuffer {
            samples: vec![0.5, 3.0, -3.0],
            sample_rate: 8000,
        };
        let limiter = Limiter {
            target_peak: 1.0,
            observed_peak: 1.0,
            gain: 1.0,
        };
        let asset = encode_wav(&buffer, &limiter).expect("encode failed");
        let pcm: Vec<i16> = asset.as_bytes()[WAV_HEADER_LEN..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(pcm, vec![16384, 32767, -32767]);
        assert_eq!(u32_at(asset.as_bytes(), 24), 8000);
    }

    #[test]
    fn encode_rejects_overflowing_byte_rate() {
        let buffer = SampleBuffer {
            samples: vec![0.0; 3],
            sample_rate: 3_000_000_000,
        };
        let limiter = Limiter::analyze(&buffer.samples, 0.85);
        assert!(matches!(
            encode_wav(&buffer, &limiter),
            Err(SynthError::InvalidSampleRate { sample_rate: 3_000_000_000 })
        ));

        let settings = RenderSettings {
            sample_rate: 3_000_000_000,
            duration_secs: 1e-9,
            ..RenderSettings::default()
        };
        assert!(render_wav(&CYBER_GROOVE, &settings).is_err());
    }

    #[test]
    fn data_uri_has_prefix_and_decodes() {
        let asset = default_wav();
        let uri = asset.data_uri().expect("encode failed");
        assert!(uri.starts_with("data:audio/wav;base64,UklGR"));

        let payload = &uri[DATA_URI_PREFIX.len()..];
        assert_eq!(payload.len(), asset.len().div_ceil(3) * 4);
        let decoded = STANDARD.decode(payload).expect("invalid base64");
        assert_eq!(decoded, asset.as_bytes());
    }

    #[test]
    fn chunked_encoding_matches_single_shot() {
        // Not a multiple of 3, and spans several chunks.
        let asset = WavAsset {
            bytes: (0..(BASE64_CHUNK * 2 + 7)).map(|i| (i % 251) as u8).collect(),
        };
        let uri = asset.data_uri().expect("encode failed");
        let expected = format!("{DATA_URI_PREFIX}{}", STANDARD.encode(asset.as_bytes()));
        assert_eq!(uri, expected);
    }
}

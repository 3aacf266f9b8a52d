//! Helpers for the audio payloads the backend exchanges: base64 inline
//! audio and mono PCM16 WAV containers.

use std::io::Cursor;

use anyhow::{Context, Result, bail};
use base64::Engine;

/// Decodes a base64 inline audio payload to raw bytes.
pub fn decode_inline_audio(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("inline audio is not valid base64")
}

/// Whether `bytes` start with a RIFF/WAVE container header.
pub fn is_riff_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Mono PCM16 samples together with their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoPcm {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl MonoPcm {
    /// The recording length in whole milliseconds.
    pub fn duration_millis(&self) -> u64 {
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}

/// Reads a PCM16 WAV container into mono samples.
///
/// Multi-channel input is reduced to its first channel. Anything but
/// 16-bit integer samples is rejected.
pub fn read_wav_mono(bytes: &[u8]) -> Result<MonoPcm> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).context("recording is not a WAV container")?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!(
            "recording must be PCM16, got {}-bit {:?}",
            spec.bits_per_sample,
            spec.sample_format
        );
    }
    let channels = spec.channels as usize;
    let samples = reader
        .samples::<i16>()
        .step_by(channels)
        .collect::<Result<Vec<_>, _>>()
        .context("recording contains corrupt samples")?;
    Ok(MonoPcm {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Writes mono PCM16 samples into an in-memory WAV container.
pub fn write_pcm16_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .context("failed to start the WAV container")?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize().context("failed to finish the WAV container")?;
    }
    Ok(cursor.into_inner())
}

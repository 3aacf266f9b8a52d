//! Cuts a finished recording into bounded segments for the voice session.
//!
//! Segmentation is a caller-side policy: the session itself only ever sees
//! one opaque byte buffer per segment.

use anyhow::{Context, Result};
use bankvoice_core::audio;

/// Splits a PCM16 WAV recording into windows of at most `window_secs`
/// seconds, each re-wrapped as a standalone WAV container.
///
/// The trailing window may be shorter; an empty recording yields no
/// segments.
pub fn segment_recording(wav_bytes: &[u8], window_secs: u64) -> Result<Vec<Vec<u8>>> {
    let pcm = audio::read_wav_mono(wav_bytes).context("cannot segment the recording")?;
    let window = (pcm.sample_rate as u64 * window_secs) as usize;
    pcm.samples
        .chunks(window)
        .map(|chunk| audio::write_pcm16_wav(chunk, pcm.sample_rate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(seconds: u64, sample_rate: u32) -> Vec<u8> {
        let samples: Vec<i16> = (0..seconds * sample_rate as u64)
            .map(|i| (i % 256) as i16)
            .collect();
        audio::write_pcm16_wav(&samples, sample_rate).unwrap()
    }

    #[test]
    fn ten_seconds_cut_into_four_second_windows() {
        let segments = segment_recording(&recording(10, 8_000), 4).unwrap();
        assert_eq!(segments.len(), 3);

        let lengths: Vec<u64> = segments
            .iter()
            .map(|seg| audio::read_wav_mono(seg).unwrap().duration_millis())
            .collect();
        assert_eq!(lengths, vec![4_000, 4_000, 2_000]);
    }

    #[test]
    fn each_segment_is_a_standalone_wav_at_the_source_rate() {
        let segments = segment_recording(&recording(5, 16_000), 4).unwrap();
        for segment in &segments {
            assert!(audio::is_riff_wav(segment));
            assert_eq!(audio::read_wav_mono(segment).unwrap().sample_rate, 16_000);
        }
    }

    #[test]
    fn short_recording_is_a_single_segment() {
        let segments = segment_recording(&recording(2, 8_000), 4).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn empty_recording_yields_no_segments() {
        let empty = audio::write_pcm16_wav(&[], 8_000).unwrap();
        assert!(segment_recording(&empty, 4).unwrap().is_empty());
    }

    #[test]
    fn non_wav_input_is_an_error() {
        assert!(segment_recording(b"not audio", 4).is_err());
    }
}

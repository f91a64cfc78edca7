//! Narration PCM decoding.
//!
//! The speech model delivers raw signed 16-bit little-endian PCM, mono, at
//! 24 000 Hz.  [`decode_speech`] converts that byte stream into a normalized
//! `f32` [`PcmClip`] ready for the playout thread.

use thiserror::Error;

/// Sample rate of the raw narration PCM delivered by the speech model, in Hz.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors produced while decoding a narration byte stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload contained no bytes at all.
    #[error("empty audio payload")]
    Empty,

    /// The payload length is not a whole number of 16-bit samples.
    #[error("audio payload of {0} bytes is not a whole number of 16-bit samples")]
    OddLength(usize),
}

// ---------------------------------------------------------------------------
// PcmClip
// ---------------------------------------------------------------------------

/// A decoded, playable audio clip.
///
/// Samples are normalized `f32` in `[-1.0, 1.0)`, non-interleaved mono.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    /// Normalized PCM samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (always 1 for narration clips).
    pub channels: u16,
}

impl PcmClip {
    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }
}

// ---------------------------------------------------------------------------
// decode_speech
// ---------------------------------------------------------------------------

/// Decode raw signed 16-bit little-endian PCM into a [`PcmClip`].
///
/// Each sample is normalized as `int16 / 32768.0`, yielding values in
/// `[-1.0, 1.0)`.  The output holds exactly `raw.len() / 2` samples.
///
/// # Errors
///
/// * [`DecodeError::Empty`] when `raw` is empty.
/// * [`DecodeError::OddLength`] when `raw.len()` is odd — a truncated stream
///   is reported rather than silently dropping the trailing byte.
///
/// # Example
///
/// ```rust
/// use story_time::audio::decode_speech;
///
/// // Two samples: 0 and -32768 (i16::MIN), little-endian
/// let clip = decode_speech(&[0x00, 0x00, 0x00, 0x80]).unwrap();
/// assert_eq!(clip.samples.len(), 2);
/// assert_eq!(clip.samples[0], 0.0);
/// assert_eq!(clip.samples[1], -1.0);
/// ```
pub fn decode_speech(raw: &[u8]) -> Result<PcmClip, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }
    if raw.len() % 2 != 0 {
        return Err(DecodeError::OddLength(raw.len()));
    }

    let samples = raw
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
        .collect();

    Ok(PcmClip {
        samples,
        sample_rate: SPEECH_SAMPLE_RATE,
        channels: 1,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

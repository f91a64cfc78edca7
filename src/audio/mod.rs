//! Audio pipeline — narration decoding → resampling → playout.
//!
//! # Pipeline
//!
//! ```text
//! raw PCM bytes (speech model) → decode_speech → PcmClip (24 kHz mono f32)
//!       → OutputCommand::Play → audio-playout thread → resample → cpal
//! ```

pub mod decode;
pub mod output;
pub mod resample;

pub use decode::{decode_speech, DecodeError, PcmClip, SPEECH_SAMPLE_RATE};
pub use output::{AudioOutput, OutputCommand, OutputError};
pub use resample::resample;

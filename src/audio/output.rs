//! Narration playout via `cpal`.
//!
//! `cpal::Stream` is not `Send` on every platform, so the stream lives on a
//! dedicated `audio-playout` OS thread.  [`AudioOutput::start`] spawns that
//! thread; commands arrive over a `std::sync::mpsc` channel and end-of-clip
//! notifications travel back on a tokio unbounded channel as the token the
//! clip was started with.
//!
//! There is exactly one playout slot: starting a clip replaces whatever was
//! in the slot, so at most one sound is ever audible.
//!
//! ```text
//! StoryRunner ── OutputCommand ──▶ audio-playout thread ──▶ cpal callback
//!      ▲                                                        │
//!      └─────────────── clip token on end-of-clip ──────────────┘
//! ```

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use super::decode::PcmClip;
use super::resample::resample;

// ---------------------------------------------------------------------------
// OutputCommand
// ---------------------------------------------------------------------------

/// Commands accepted by the playout thread.
#[derive(Debug, Clone)]
pub enum OutputCommand {
    /// Replace the playout slot with `clip`, starting from sample 0.
    ///
    /// `token` is echoed back on the end-of-clip channel when the last
    /// sample has been written to the device.
    Play { clip: Arc<PcmClip>, token: u64 },
    /// Clear the playout slot.  Safe to send when nothing is playing.
    Stop,
}

// ---------------------------------------------------------------------------
// OutputError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the playout stream.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio-playout thread exited before reporting its config")]
    ThreadGone,
}

// ---------------------------------------------------------------------------
// Playout slot
// ---------------------------------------------------------------------------

/// The clip currently being written to the device, with a cursor.
struct Playout {
    samples: Vec<f32>,
    pos: usize,
    token: u64,
}

type PlayoutSlot = Arc<Mutex<Option<Playout>>>;

/// Fill one output buffer from the playout slot.
///
/// Writes the current clip sample to every channel of each frame, advancing
/// the cursor one sample per frame, and zero-fills once the clip (or slot)
/// is exhausted.  Returns the clip's token the first time the cursor passes
/// the end, clearing the slot.
fn fill_frames(slot: &Mutex<Option<Playout>>, data: &mut [f32], channels: usize) -> Option<u64> {
    let mut guard = slot.lock().unwrap();
    let mut ended = None;

    for frame in data.chunks_mut(channels.max(1)) {
        let sample = match guard.as_mut() {
            Some(p) if p.pos < p.samples.len() => {
                let s = p.samples[p.pos];
                p.pos += 1;
                s
            }
            Some(p) => {
                ended = Some(p.token);
                *guard = None;
                0.0
            }
            None => 0.0,
        };
        for out in frame.iter_mut() {
            *out = sample;
        }
    }

    ended
}

// ---------------------------------------------------------------------------
// AudioOutput
// ---------------------------------------------------------------------------

/// Handle to the `audio-playout` thread.
///
/// Dropping the handle closes the command channel, which stops the thread
/// and releases the underlying cpal stream.
pub struct AudioOutput {
    command_tx: mpsc::Sender<OutputCommand>,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Spawn the playout thread on the system default output device.
    ///
    /// `done_tx` receives each clip's token exactly once, after its last
    /// sample has been handed to the device.
    ///
    /// # Errors
    ///
    /// Fails when no output device exists or the platform rejects the
    /// stream configuration.  Callers may run without playback in that case
    /// (the UI keeps working; read-aloud stays disabled).
    pub fn start(done_tx: UnboundedSender<u64>) -> Result<Self, OutputError> {
        let (command_tx, command_rx) = mpsc::channel::<OutputCommand>();
        let (setup_tx, setup_rx) = mpsc::channel::<Result<(u32, u16), OutputError>>();

        std::thread::Builder::new()
            .name("audio-playout".into())
            .spawn(move || playout_thread(command_rx, done_tx, setup_tx))
            .expect("failed to spawn audio-playout thread");

        let (sample_rate, channels) = setup_rx.recv().map_err(|_| OutputError::ThreadGone)??;

        Ok(Self {
            command_tx,
            sample_rate,
            channels,
        })
    }

    /// Sender half of the command channel, for the playback controller.
    pub fn command_sender(&self) -> mpsc::Sender<OutputCommand> {
        self.command_tx.clone()
    }

    /// Output device sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output device channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Body of the `audio-playout` thread: owns the cpal stream for its whole
/// lifetime and drains [`OutputCommand`]s until the sender side closes.
fn playout_thread(
    command_rx: mpsc::Receiver<OutputCommand>,
    done_tx: UnboundedSender<u64>,
    setup_tx: mpsc::Sender<Result<(u32, u16), OutputError>>,
) {
    let setup = || -> Result<(cpal::Device, cpal::StreamConfig, u32, u16), OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        Ok((device, supported.into(), sample_rate, channels))
    };

    let (device, config, sample_rate, channels) = match setup() {
        Ok(parts) => parts,
        Err(e) => {
            let _ = setup_tx.send(Err(e));
            return;
        }
    };

    let slot: PlayoutSlot = Arc::new(Mutex::new(None));

    let callback_slot = Arc::clone(&slot);
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            if let Some(token) = fill_frames(&callback_slot, data, channels as usize) {
                // Ignore send errors; the receiver may have been dropped.
                let _ = done_tx.send(token);
            }
        },
        |err: cpal::StreamError| {
            log::error!("cpal output stream error: {err}");
        },
        None, // no timeout
    );

    let stream = match stream.map_err(OutputError::from).and_then(|s| {
        s.play()?;
        Ok(s)
    }) {
        Ok(s) => s,
        Err(e) => {
            let _ = setup_tx.send(Err(e));
            return;
        }
    };

    let _ = setup_tx.send(Ok((sample_rate, channels)));
    log::info!("Audio playout started ({sample_rate} Hz, {channels} ch)");

    while let Ok(cmd) = command_rx.recv() {
        match cmd {
            OutputCommand::Play { clip, token } => {
                let samples = resample(&clip.samples, clip.sample_rate, sample_rate);
                *slot.lock().unwrap() = Some(Playout {
                    samples,
                    pos: 0,
                    token,
                });
            }
            OutputCommand::Stop => {
                *slot.lock().unwrap() = None;
            }
        }
    }

    // Command channel closed — release the stream and exit.
    drop(stream);
    log::info!("Audio playout stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

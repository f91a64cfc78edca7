//! Read-aloud playback state machine.
//!
//! [`PlaybackController`] owns the logical playback state and drives a
//! [`PlaybackSink`] — the playout thread in the real app, a recording double
//! in tests.  The state machine is:
//!
//! ```text
//! Idle ──play(i), clip present──▶ Playing(i)
//! Playing(i) ──play(i) again───▶ Idle          (toggle)
//! Playing(i) ──play(j)─────────▶ Idle ──▶ Playing(j)   (stop, then start)
//! Playing(i) ──stop / end-of-clip / navigation──▶ Idle
//! ```
//!
//! Every started clip carries a fresh token; an end-of-clip notification for
//! anything but the current token is stale and ignored.

use std::sync::mpsc;
use std::sync::Arc;

use crate::audio::{OutputCommand, PcmClip};

// ---------------------------------------------------------------------------
// PlaybackSink
// ---------------------------------------------------------------------------

/// Where started/stopped clips go.  Object-safe so the app can fall back to
/// a silent sink when no output device exists.
pub trait PlaybackSink: Send + Sync {
    /// Begin output of `clip` from sample 0 under `token`.
    fn start(&mut self, clip: Arc<PcmClip>, token: u64);
    /// Release any active output.  Must be safe to call when idle.
    fn stop(&mut self);
}

impl PlaybackSink for Box<dyn PlaybackSink> {
    fn start(&mut self, clip: Arc<PcmClip>, token: u64) {
        (**self).start(clip, token)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Forwards to the `audio-playout` thread over its command channel.
pub struct CommandSink {
    tx: mpsc::Sender<OutputCommand>,
}

impl CommandSink {
    pub fn new(tx: mpsc::Sender<OutputCommand>) -> Self {
        Self { tx }
    }
}

impl PlaybackSink for CommandSink {
    fn start(&mut self, clip: Arc<PcmClip>, token: u64) {
        if self.tx.send(OutputCommand::Play { clip, token }).is_err() {
            log::warn!("audio-playout thread is gone; dropping play command");
        }
    }

    fn stop(&mut self) {
        // Ignore send errors; a dead playout thread has nothing to stop.
        let _ = self.tx.send(OutputCommand::Stop);
    }
}

/// Discards everything — used when no output device is available.
pub struct SilentSink;

impl PlaybackSink for SilentSink {
    fn start(&mut self, _clip: Arc<PcmClip>, _token: u64) {}
    fn stop(&mut self) {}
}

// ---------------------------------------------------------------------------
// PlaybackPhase / PlaybackChange
// ---------------------------------------------------------------------------

/// Logical playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Nothing is playing.
    Idle,
    /// The clip for `page` is playing under `token`.
    Playing { page: usize, token: u64 },
}

/// What a play request changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackChange {
    /// Output began for this page.
    Started(usize),
    /// Output was stopped.
    Stopped,
    /// Nothing happened (no clip for the page).
    Unchanged,
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Owns the at-most-one active playback and its transitions.
pub struct PlaybackController<S: PlaybackSink> {
    sink: S,
    phase: PlaybackPhase,
    next_token: u64,
}

impl<S: PlaybackSink> PlaybackController<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            phase: PlaybackPhase::Idle,
            next_token: 0,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Page currently being read aloud, if any.
    pub fn playing_page(&self) -> Option<usize> {
        match self.phase {
            PlaybackPhase::Playing { page, .. } => Some(page),
            PlaybackPhase::Idle => None,
        }
    }

    /// Unconditionally release any active playback.  Idempotent — callers
    /// (navigation in particular) invoke this without checking the phase.
    /// Returns whether something was actually playing.
    pub fn stop(&mut self) -> bool {
        let was_playing = matches!(self.phase, PlaybackPhase::Playing { .. });
        self.sink.stop();
        self.phase = PlaybackPhase::Idle;
        was_playing
    }

    /// Handle a play request for `page`.
    ///
    /// * Already playing this page → stop (toggle, no restart).
    /// * `clip` is `None` → no-op; the request is disabled at the interface
    ///   boundary, not a failure.
    /// * Otherwise → stop whatever is active, then start `clip` from
    ///   sample 0.  Stopping always completes before starting.
    pub fn toggle(&mut self, page: usize, clip: Option<&Arc<PcmClip>>) -> PlaybackChange {
        if self.playing_page() == Some(page) {
            self.stop();
            return PlaybackChange::Stopped;
        }

        let Some(clip) = clip else {
            return PlaybackChange::Unchanged;
        };

        self.stop();

        let token = self.next_token;
        self.next_token += 1;
        self.sink.start(Arc::clone(clip), token);
        self.phase = PlaybackPhase::Playing { page, token };

        PlaybackChange::Started(page)
    }

    /// Handle an end-of-clip notification from the playout thread.
    ///
    /// The playout slot has already drained, so no sink call is needed —
    /// this only retires the logical state.  A token that is not the current
    /// one belongs to a clip that was already stopped or replaced and is
    /// ignored.  Returns whether the controller transitioned to idle.
    pub fn on_clip_ended(&mut self, token: u64) -> bool {
        match self.phase {
            PlaybackPhase::Playing { token: current, .. } if current == token => {
                self.phase = PlaybackPhase::Idle;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::audio::decode_speech;

    // -----------------------------------------------------------------------
    // Test double
    // -----------------------------------------------------------------------

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SinkCall {
        Start(u64),
        Stop,
    }

    /// Records every sink call in order.
    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<SinkCall>>>,
    }

    impl RecordingSink {
        fn calls(&self) -> Vec<SinkCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PlaybackSink for RecordingSink {
        fn start(&mut self, _clip: Arc<PcmClip>, token: u64) {
            self.calls.lock().unwrap().push(SinkCall::Start(token));
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push(SinkCall::Stop);
        }
    }

    fn clip() -> Arc<PcmClip> {
        Arc::new(decode_speech(&[0x00, 0x10, 0x00, 0xF0]).unwrap())
    }

    fn controller() -> (PlaybackController<RecordingSink>, RecordingSink) {
        let sink = RecordingSink::default();
        (PlaybackController::new(sink.clone()), sink)
    }

    // ---- starting ----------------------------------------------------------

    #[test]
    fn idle_play_with_clip_starts_playing() {
        let (mut ctl, sink) = controller();
        let change = ctl.toggle(2, Some(&clip()));

        assert_eq!(change, PlaybackChange::Started(2));
        assert_eq!(ctl.playing_page(), Some(2));
        // Stop always precedes start, even from idle.
        assert_eq!(sink.calls(), [SinkCall::Stop, SinkCall::Start(0)]);
    }

    #[test]
    fn play_without_clip_is_a_noop() {
        let (mut ctl, sink) = controller();
        let change = ctl.toggle(0, None);

        assert_eq!(change, PlaybackChange::Unchanged);
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
        assert!(sink.calls().is_empty());
    }

    // ---- toggle law --------------------------------------------------------

    #[test]
    fn play_again_on_same_page_stops_without_restart() {
        let (mut ctl, sink) = controller();
        ctl.toggle(1, Some(&clip()));
        let change = ctl.toggle(1, Some(&clip()));

        assert_eq!(change, PlaybackChange::Stopped);
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
        // No second Start call.
        assert_eq!(
            sink.calls(),
            [SinkCall::Stop, SinkCall::Start(0), SinkCall::Stop]
        );
    }

    // ---- page switch -------------------------------------------------------

    #[test]
    fn switching_pages_stops_before_starting() {
        let (mut ctl, sink) = controller();
        ctl.toggle(0, Some(&clip()));
        let change = ctl.toggle(1, Some(&clip()));

        assert_eq!(change, PlaybackChange::Started(1));
        assert_eq!(ctl.playing_page(), Some(1));
        assert_eq!(
            sink.calls(),
            [
                SinkCall::Stop,
                SinkCall::Start(0),
                SinkCall::Stop,
                SinkCall::Start(1),
            ]
        );
    }

    // ---- stop --------------------------------------------------------------

    #[test]
    fn stop_is_idempotent() {
        let (mut ctl, sink) = controller();
        assert!(!ctl.stop());
        assert!(!ctl.stop());
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
        // The sink is told to stop each time; the playout slot tolerates it.
        assert_eq!(sink.calls(), [SinkCall::Stop, SinkCall::Stop]);
    }

    #[test]
    fn stop_while_playing_reports_it() {
        let (mut ctl, _sink) = controller();
        ctl.toggle(3, Some(&clip()));
        assert!(ctl.stop());
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
    }

    // ---- end-of-clip -------------------------------------------------------

    #[test]
    fn clip_ended_with_current_token_goes_idle() {
        let (mut ctl, _sink) = controller();
        ctl.toggle(0, Some(&clip()));
        let PlaybackPhase::Playing { token, .. } = ctl.phase() else {
            panic!("expected playing");
        };

        assert!(ctl.on_clip_ended(token));
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn stale_clip_ended_is_ignored() {
        let (mut ctl, _sink) = controller();
        ctl.toggle(0, Some(&clip())); // token 0
        ctl.toggle(0, Some(&clip())); // toggle off
        ctl.toggle(1, Some(&clip())); // token 1

        // The first clip's end notification arrives late.
        assert!(!ctl.on_clip_ended(0));
        assert_eq!(ctl.playing_page(), Some(1));
    }

    #[test]
    fn clip_ended_while_idle_is_ignored() {
        let (mut ctl, _sink) = controller();
        assert!(!ctl.on_clip_ended(0));
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
    }

    // ---- tokens ------------------------------------------------------------

    #[test]
    fn each_start_gets_a_fresh_token() {
        let (mut ctl, sink) = controller();
        ctl.toggle(0, Some(&clip()));
        ctl.toggle(1, Some(&clip()));
        ctl.toggle(2, Some(&clip()));

        let starts: Vec<SinkCall> = sink
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Start(_)))
            .collect();
        assert_eq!(
            starts,
            [SinkCall::Start(0), SinkCall::Start(1), SinkCall::Start(2)]
        );
    }
}

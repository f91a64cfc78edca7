//! Story orchestrator — the single task that owns all story state.
//!
//! [`StoryRunner::run`] drives a `tokio::select!` loop over three inputs:
//!
//! * [`StoryCommand`]s from the UI (create story, navigate, toggle
//!   playback, chat).
//! * Completions from spawned generation tasks (story text, page assets,
//!   chat replies) on an internal channel.
//! * End-of-clip tokens from the `audio-playout` thread.
//!
//! All mutation of the [`PageStore`], [`PlaybackController`] and
//! [`ChatSession`] happens inline in this task, so no half-applied state is
//! ever observable.  Results of spawned work carry the generation / request
//! stamp they were started under and are discarded when stale; in-flight
//! work is never cancelled — navigation only stops playback.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::chat::ChatSession;
use crate::gen::{GenError, StoryBackend};
use crate::story::assets::{load_page_assets, AssetOutcome};
use crate::story::page::{AssetUpdate, PageStore, StoryPage};
use crate::story::playback::{PlaybackChange, PlaybackController, PlaybackSink};

// ---------------------------------------------------------------------------
// User-facing failure messages
// ---------------------------------------------------------------------------

/// Shown when story generation fails.
pub const STORY_FAILED_MESSAGE: &str =
    "Sorry, I couldn't come up with a story right now. Please try another topic!";

/// Shown when the topic box is empty.
pub const TOPIC_MISSING_MESSAGE: &str = "Please enter a topic for the story!";

/// Shown when the chat companion fails to reply.
pub const CHAT_FAILED_MESSAGE: &str = "Sparky is taking a little nap. Try again in a moment!";

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the runner.
#[derive(Debug, Clone)]
pub enum StoryCommand {
    /// Generate a new story about `topic`.
    CreateStory { topic: String },
    /// Advance to the next page (no-op at the last page).
    NextPage,
    /// Step back to the previous page (no-op at the first page).
    PrevPage,
    /// Play the current page's narration, or stop it if already playing.
    TogglePlayback,
    /// Send one chat message to the companion.
    SendChat { message: String },
    /// Discard the chat transcript and start a fresh session.
    NewChat,
}

/// Immutable snapshot of one page for rendering.
#[derive(Debug, Clone)]
pub struct PageView {
    pub text: String,
    pub image_url: Option<String>,
    pub has_audio: bool,
    pub loading_image: bool,
    pub loading_audio: bool,
}

/// Events delivered from the runner to the UI.
#[derive(Debug, Clone)]
pub enum StoryEvent {
    /// Story generation began.
    StoryStarted,
    /// Story generation succeeded; all pages start loading their assets.
    StoryReady { pages: Vec<PageView>, index: usize },
    /// Story generation failed; any previous story is untouched.
    StoryFailed { message: String },
    /// The current page index changed through navigation.
    PageChanged { index: usize },
    /// A page's asset load settled (fully or partially).
    PageUpdated { index: usize, page: PageView },
    /// Narration playback began for this page.
    PlaybackStarted { index: usize },
    /// Narration playback stopped (toggle, navigation, or end of clip).
    PlaybackStopped,
    /// The companion replied.
    ChatReply { text: String },
    /// The chat send failed; the transcript is unchanged.
    ChatFailed { message: String },
    /// A fresh chat session was started.
    ChatCleared,
}

/// Completions from spawned generation tasks.
#[derive(Debug)]
enum WorkerMsg {
    StoryDone {
        request: u64,
        result: Result<Vec<String>, GenError>,
    },
    AssetsDone {
        generation: u64,
        index: usize,
        outcome: AssetOutcome,
    },
    ChatDone {
        message: String,
        result: Result<String, GenError>,
    },
}

fn page_view(page: &StoryPage) -> PageView {
    PageView {
        text: page.text.clone(),
        image_url: page.image_url.clone(),
        has_audio: page.audio.is_some(),
        loading_image: page.loading_image,
        loading_audio: page.loading_audio,
    }
}

// ---------------------------------------------------------------------------
// StoryRunner
// ---------------------------------------------------------------------------

/// Owns the page store, playback controller and chat session; see the
/// module docs for the loop structure.
pub struct StoryRunner<S: PlaybackSink> {
    backend: Arc<dyn StoryBackend>,
    store: PageStore,
    playback: PlaybackController<S>,
    chat: ChatSession,
    event_tx: mpsc::Sender<StoryEvent>,
    /// Id of the most recent story request; older completions are stale.
    story_request: u64,
    /// A chat reply is outstanding; further sends are ignored until it lands.
    chat_pending: bool,
}

impl<S: PlaybackSink + 'static> StoryRunner<S> {
    pub fn new(backend: Arc<dyn StoryBackend>, sink: S, event_tx: mpsc::Sender<StoryEvent>) -> Self {
        Self {
            backend,
            store: PageStore::new(),
            playback: PlaybackController::new(sink),
            chat: ChatSession::new(),
            event_tx,
            story_request: 0,
            chat_pending: false,
        }
    }

    /// Run until the command channel closes.
    ///
    /// Spawn this as a tokio task from `main()`; `clip_ended_rx` is the
    /// token channel handed to [`AudioOutput::start`](crate::audio::AudioOutput::start).
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<StoryCommand>,
        mut clip_ended_rx: mpsc::UnboundedReceiver<u64>,
    ) {
        let (worker_tx, mut worker_rx) = mpsc::unbounded_channel::<WorkerMsg>();

        loop {
            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd, &worker_tx).await,
                    None => break,
                },
                Some(msg) = worker_rx.recv() => {
                    self.handle_worker(msg, &worker_tx).await;
                }
                Some(token) = clip_ended_rx.recv() => {
                    if self.playback.on_clip_ended(token) {
                        self.emit(StoryEvent::PlaybackStopped).await;
                    }
                }
            }
        }

        log::info!("story runner shutting down");
    }

    async fn emit(&self, event: StoryEvent) {
        // Ignore send errors; the UI may have closed.
        let _ = self.event_tx.send(event).await;
    }

    // -----------------------------------------------------------------------
    // Command handling
    // -----------------------------------------------------------------------

    async fn handle_command(
        &mut self,
        cmd: StoryCommand,
        worker_tx: &mpsc::UnboundedSender<WorkerMsg>,
    ) {
        match cmd {
            StoryCommand::CreateStory { topic } => {
                let topic = topic.trim().to_string();
                if topic.is_empty() {
                    self.emit(StoryEvent::StoryFailed {
                        message: TOPIC_MISSING_MESSAGE.into(),
                    })
                    .await;
                    return;
                }

                if self.playback.stop() {
                    self.emit(StoryEvent::PlaybackStopped).await;
                }

                self.story_request += 1;
                let request = self.story_request;
                self.emit(StoryEvent::StoryStarted).await;
                log::info!("generating story about {topic:?} (request {request})");

                let backend = Arc::clone(&self.backend);
                let tx = worker_tx.clone();
                tokio::spawn(async move {
                    let result = backend.story_pages(&topic).await;
                    let _ = tx.send(WorkerMsg::StoryDone { request, result });
                });
            }

            StoryCommand::NextPage => self.navigate(true, worker_tx).await,
            StoryCommand::PrevPage => self.navigate(false, worker_tx).await,

            StoryCommand::TogglePlayback => {
                let index = self.store.current_index();
                let clip = self.store.get(index).and_then(|p| p.audio.clone());
                match self.playback.toggle(index, clip.as_ref()) {
                    PlaybackChange::Started(index) => {
                        self.emit(StoryEvent::PlaybackStarted { index }).await;
                    }
                    PlaybackChange::Stopped => self.emit(StoryEvent::PlaybackStopped).await,
                    PlaybackChange::Unchanged => {}
                }
            }

            StoryCommand::SendChat { message } => {
                if self.chat_pending {
                    log::debug!("chat send ignored; a reply is already pending");
                    return;
                }
                self.chat_pending = true;

                let backend = Arc::clone(&self.backend);
                let turns = self.chat.turns().to_vec();
                let tx = worker_tx.clone();
                tokio::spawn(async move {
                    let result = backend.chat_reply(&turns, &message).await;
                    let _ = tx.send(WorkerMsg::ChatDone { message, result });
                });
            }

            StoryCommand::NewChat => {
                self.chat = ChatSession::new();
                self.emit(StoryEvent::ChatCleared).await;
            }
        }
    }

    /// Stop playback, move the index (clamped), then lazily load the new
    /// current page.  Playback stops even when the move clamps to a no-op.
    async fn navigate(&mut self, forward: bool, worker_tx: &mpsc::UnboundedSender<WorkerMsg>) {
        if self.playback.stop() {
            self.emit(StoryEvent::PlaybackStopped).await;
        }

        let moved = if forward {
            self.store.go_next()
        } else {
            self.store.go_prev()
        };
        if !moved {
            return;
        }

        self.emit(StoryEvent::PageChanged {
            index: self.store.current_index(),
        })
        .await;
        self.request_current_assets(worker_tx);
    }

    /// Spawn an asset load for the current page unless its assets are
    /// already resolved or a load is outstanding.  Only the current page is
    /// ever loaded.
    fn request_current_assets(&mut self, worker_tx: &mpsc::UnboundedSender<WorkerMsg>) {
        let index = self.store.current_index();
        if !self.store.needs_assets(index) {
            return;
        }
        let Some(page) = self.store.get(index) else {
            return;
        };

        let need_image = page.image_url.is_none();
        let need_audio = page.audio.is_none();
        let text = page.text.clone();

        self.store.mark_requested(index);
        let generation = self.store.generation();

        let backend = Arc::clone(&self.backend);
        let tx = worker_tx.clone();
        tokio::spawn(async move {
            let outcome = load_page_assets(backend.as_ref(), &text, need_image, need_audio).await;
            let _ = tx.send(WorkerMsg::AssetsDone {
                generation,
                index,
                outcome,
            });
        });
    }

    // -----------------------------------------------------------------------
    // Worker completions
    // -----------------------------------------------------------------------

    async fn handle_worker(
        &mut self,
        msg: WorkerMsg,
        worker_tx: &mpsc::UnboundedSender<WorkerMsg>,
    ) {
        match msg {
            WorkerMsg::StoryDone { request, result } => {
                if request != self.story_request {
                    log::debug!("discarding story result for superseded request {request}");
                    return;
                }

                match result {
                    Ok(texts) => {
                        log::info!("story ready with {} pages", texts.len());
                        self.store.replace_all(texts);
                        let pages: Vec<PageView> =
                            self.store.pages().iter().map(page_view).collect();
                        self.emit(StoryEvent::StoryReady { pages, index: 0 }).await;
                        self.request_current_assets(worker_tx);
                    }
                    Err(e) => {
                        log::warn!("story generation failed: {e}");
                        self.emit(StoryEvent::StoryFailed {
                            message: STORY_FAILED_MESSAGE.into(),
                        })
                        .await;
                    }
                }
            }

            WorkerMsg::AssetsDone {
                generation,
                index,
                outcome,
            } => {
                if let Some(err) = &outcome.image_error {
                    log::warn!("illustration for page {index} failed: {err}");
                }
                if let Some(err) = &outcome.audio_error {
                    log::warn!("narration for page {index} failed: {err}");
                }

                let applied = self.store.apply_assets(AssetUpdate {
                    generation,
                    index,
                    image_url: outcome.image_url,
                    audio: outcome.audio,
                });

                if applied {
                    if let Some(page) = self.store.get(index) {
                        self.emit(StoryEvent::PageUpdated {
                            index,
                            page: page_view(page),
                        })
                        .await;
                    }
                } else {
                    log::debug!("discarding asset result for a replaced story (page {index})");
                }
            }

            WorkerMsg::ChatDone { message, result } => {
                self.chat_pending = false;
                match result {
                    Ok(reply) => {
                        self.chat.record_exchange(message, reply.clone());
                        self.emit(StoryEvent::ChatReply { text: reply }).await;
                    }
                    Err(e) => {
                        log::warn!("chat reply failed: {e}");
                        self.emit(StoryEvent::ChatFailed {
                            message: CHAT_FAILED_MESSAGE.into(),
                        })
                        .await;
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::chat::ChatTurn;
    use crate::story::playback::SilentSink;

    // -----------------------------------------------------------------------
    // Test double
    // -----------------------------------------------------------------------

    /// Backend that answers instantly.  A story about the topic "bad" fails;
    /// chat replies report how many transcript turns the call saw.
    #[derive(Default)]
    struct FakeBackend {
        fail_chat: bool,
        fail_narration: bool,
    }

    impl FakeBackend {
        fn ok() -> Arc<dyn StoryBackend> {
            Arc::new(Self::default())
        }

        fn failing_chat() -> Arc<dyn StoryBackend> {
            Arc::new(Self {
                fail_chat: true,
                ..Self::default()
            })
        }

        fn failing_narration() -> Arc<dyn StoryBackend> {
            Arc::new(Self {
                fail_narration: true,
                ..Self::default()
            })
        }
    }

    #[async_trait]
    impl StoryBackend for FakeBackend {
        async fn story_pages(&self, topic: &str) -> Result<Vec<String>, GenError> {
            if topic == "bad" {
                return Err(GenError::Empty);
            }
            Ok((1..=5).map(|i| format!("Page {i} about {topic}")).collect())
        }

        async fn illustration(&self, _page_text: &str) -> Result<String, GenError> {
            Ok("data:image/png;base64,AAAA".into())
        }

        async fn narration(&self, _page_text: &str) -> Result<Vec<u8>, GenError> {
            if self.fail_narration {
                return Err(GenError::Empty);
            }
            Ok(vec![0x00, 0x10, 0x00, 0xF0])
        }

        async fn chat_reply(
            &self,
            turns: &[ChatTurn],
            _message: &str,
        ) -> Result<String, GenError> {
            if self.fail_chat {
                return Err(GenError::Timeout);
            }
            Ok(format!("{} turns seen", turns.len()))
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Harness {
        command_tx: mpsc::Sender<StoryCommand>,
        event_rx: mpsc::Receiver<StoryEvent>,
        clip_ended_tx: mpsc::UnboundedSender<u64>,
    }

    fn spawn_runner(backend: Arc<dyn StoryBackend>) -> Harness {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        let (clip_ended_tx, clip_ended_rx) = mpsc::unbounded_channel();

        let runner = StoryRunner::new(backend, SilentSink, event_tx);
        tokio::spawn(runner.run(command_rx, clip_ended_rx));

        Harness {
            command_tx,
            event_rx,
            clip_ended_tx,
        }
    }

    impl Harness {
        async fn send(&self, cmd: StoryCommand) {
            self.command_tx.send(cmd).await.expect("runner alive");
        }

        /// Receive the next event, failing the test after five seconds.
        async fn next_event(&mut self) -> StoryEvent {
            tokio::time::timeout(Duration::from_secs(5), self.event_rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("runner alive")
        }

        /// Skip events until `pred` matches, returning the matching event.
        async fn event_matching(
            &mut self,
            pred: impl Fn(&StoryEvent) -> bool,
        ) -> StoryEvent {
            loop {
                let event = self.next_event().await;
                if pred(&event) {
                    return event;
                }
            }
        }

        async fn create_story(&mut self) {
            self.send(StoryCommand::CreateStory {
                topic: "a friendly dragon".into(),
            })
            .await;
            self.event_matching(|e| matches!(e, StoryEvent::StoryReady { .. }))
                .await;
        }

        /// Wait for page 0's assets so playback can start.
        async fn create_loaded_story(&mut self) {
            self.create_story().await;
            self.event_matching(|e| matches!(e, StoryEvent::PageUpdated { index: 0, .. }))
                .await;
        }
    }

    // -----------------------------------------------------------------------
    // Story creation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_story_builds_loading_pages_and_loads_page_zero() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.send(StoryCommand::CreateStory {
            topic: "a friendly dragon".into(),
        })
        .await;

        assert!(matches!(h.next_event().await, StoryEvent::StoryStarted));

        let StoryEvent::StoryReady { pages, index } = h.next_event().await else {
            panic!("expected StoryReady");
        };
        assert_eq!(index, 0);
        assert_eq!(pages.len(), 5);
        for page in &pages {
            assert!(page.loading_image);
            assert!(page.loading_audio);
            assert!(page.image_url.is_none());
            assert!(!page.has_audio);
        }

        // Assets arrive for the current page only.
        let StoryEvent::PageUpdated { index, page } = h.next_event().await else {
            panic!("expected PageUpdated");
        };
        assert_eq!(index, 0);
        assert!(page.image_url.is_some());
        assert!(page.has_audio);
        assert!(!page.loading_image);
        assert!(!page.loading_audio);
    }

    #[tokio::test]
    async fn blank_topic_fails_without_starting() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.send(StoryCommand::CreateStory { topic: "   ".into() }).await;

        let StoryEvent::StoryFailed { message } = h.next_event().await else {
            panic!("expected StoryFailed");
        };
        assert_eq!(message, TOPIC_MISSING_MESSAGE);
    }

    #[tokio::test]
    async fn failed_story_keeps_the_previous_story() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_story().await;

        h.send(StoryCommand::CreateStory { topic: "bad".into() }).await;
        h.event_matching(|e| matches!(e, StoryEvent::StoryFailed { .. }))
            .await;

        // The old pages are still navigable.
        h.send(StoryCommand::NextPage).await;
        let StoryEvent::PageChanged { index } = h
            .event_matching(|e| matches!(e, StoryEvent::PageChanged { .. }))
            .await
        else {
            unreachable!()
        };
        assert_eq!(index, 1);
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn navigation_clamps_at_both_ends() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_story().await;

        for _ in 0..6 {
            h.send(StoryCommand::NextPage).await;
        }
        for _ in 0..6 {
            h.send(StoryCommand::PrevPage).await;
        }
        // Sentinel so we know all navigation has been processed.
        h.send(StoryCommand::NewChat).await;

        let mut indices = Vec::new();
        loop {
            match h.next_event().await {
                StoryEvent::PageChanged { index } => indices.push(index),
                StoryEvent::ChatCleared => break,
                _ => {}
            }
        }
        assert_eq!(indices, [1, 2, 3, 4, 3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn revisited_page_is_not_reloaded() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_loaded_story().await;

        // 0 → 1 (loads page 1) → 0 (already resolved, no load).
        h.send(StoryCommand::NextPage).await;
        h.event_matching(|e| matches!(e, StoryEvent::PageUpdated { index: 1, .. }))
            .await;
        h.send(StoryCommand::PrevPage).await;
        h.send(StoryCommand::NewChat).await;

        loop {
            match h.next_event().await {
                StoryEvent::PageUpdated { index, .. } => {
                    panic!("unexpected reload of page {index}")
                }
                StoryEvent::ChatCleared => break,
                _ => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn toggle_starts_then_stops_playback() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_loaded_story().await;

        h.send(StoryCommand::TogglePlayback).await;
        let StoryEvent::PlaybackStarted { index } = h.next_event().await else {
            panic!("expected PlaybackStarted");
        };
        assert_eq!(index, 0);

        h.send(StoryCommand::TogglePlayback).await;
        assert!(matches!(h.next_event().await, StoryEvent::PlaybackStopped));
    }

    #[tokio::test]
    async fn toggle_without_a_clip_is_a_noop() {
        let mut h = spawn_runner(FakeBackend::failing_narration());
        h.create_story().await;

        // The narration side failed, so the page settles without audio.
        let StoryEvent::PageUpdated { page, .. } = h
            .event_matching(|e| matches!(e, StoryEvent::PageUpdated { index: 0, .. }))
            .await
        else {
            unreachable!()
        };
        assert!(!page.has_audio);
        assert!(page.image_url.is_some());

        h.send(StoryCommand::TogglePlayback).await;
        h.send(StoryCommand::NewChat).await;

        loop {
            match h.next_event().await {
                StoryEvent::PlaybackStarted { .. } | StoryEvent::PlaybackStopped => {
                    panic!("playback without a clip")
                }
                StoryEvent::ChatCleared => break,
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn navigation_stops_playback_before_the_index_changes() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_loaded_story().await;

        h.send(StoryCommand::TogglePlayback).await;
        h.event_matching(|e| matches!(e, StoryEvent::PlaybackStarted { .. }))
            .await;

        h.send(StoryCommand::NextPage).await;
        assert!(matches!(h.next_event().await, StoryEvent::PlaybackStopped));
        let StoryEvent::PageChanged { index } = h.next_event().await else {
            panic!("expected PageChanged after PlaybackStopped");
        };
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn end_of_clip_retires_playback() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_loaded_story().await;

        h.send(StoryCommand::TogglePlayback).await;
        h.event_matching(|e| matches!(e, StoryEvent::PlaybackStarted { .. }))
            .await;

        // First started clip carries token 0.
        h.clip_ended_tx.send(0).expect("runner alive");
        assert!(matches!(h.next_event().await, StoryEvent::PlaybackStopped));
    }

    #[tokio::test]
    async fn stale_end_of_clip_is_ignored() {
        let mut h = spawn_runner(FakeBackend::ok());
        h.create_loaded_story().await;

        h.send(StoryCommand::TogglePlayback).await; // token 0
        h.event_matching(|e| matches!(e, StoryEvent::PlaybackStarted { .. }))
            .await;
        h.send(StoryCommand::TogglePlayback).await; // stop
        h.event_matching(|e| matches!(e, StoryEvent::PlaybackStopped))
            .await;
        h.send(StoryCommand::TogglePlayback).await; // token 1
        h.event_matching(|e| matches!(e, StoryEvent::PlaybackStarted { .. }))
            .await;

        // The stopped clip's token must not kill the new playback.
        h.clip_ended_tx.send(0).expect("runner alive");
        h.send(StoryCommand::NewChat).await;

        loop {
            match h.next_event().await {
                StoryEvent::PlaybackStopped => panic!("stale token stopped playback"),
                StoryEvent::ChatCleared => break,
                _ => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn chat_replies_and_grows_the_transcript() {
        let mut h = spawn_runner(FakeBackend::ok());

        h.send(StoryCommand::SendChat {
            message: "hello".into(),
        })
        .await;
        let StoryEvent::ChatReply { text } = h.next_event().await else {
            panic!("expected ChatReply");
        };
        assert_eq!(text, "0 turns seen");

        // The exchange was recorded, so the next call sees two turns.
        h.send(StoryCommand::SendChat {
            message: "again".into(),
        })
        .await;
        let StoryEvent::ChatReply { text } = h.next_event().await else {
            panic!("expected ChatReply");
        };
        assert_eq!(text, "2 turns seen");
    }

    #[tokio::test]
    async fn failed_chat_leaves_the_transcript_untouched() {
        let mut h = spawn_runner(FakeBackend::failing_chat());

        h.send(StoryCommand::SendChat {
            message: "hello".into(),
        })
        .await;
        let StoryEvent::ChatFailed { message } = h.next_event().await else {
            panic!("expected ChatFailed");
        };
        assert_eq!(message, CHAT_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn new_chat_clears_the_session() {
        let mut h = spawn_runner(FakeBackend::ok());

        h.send(StoryCommand::SendChat {
            message: "hello".into(),
        })
        .await;
        h.event_matching(|e| matches!(e, StoryEvent::ChatReply { .. }))
            .await;

        h.send(StoryCommand::NewChat).await;
        assert!(matches!(h.next_event().await, StoryEvent::ChatCleared));

        // A fresh session sees an empty transcript again.
        h.send(StoryCommand::SendChat {
            message: "hello".into(),
        })
        .await;
        let StoryEvent::ChatReply { text } = h.next_event().await else {
            panic!("expected ChatReply");
        };
        assert_eq!(text, "0 turns seen");
    }
}

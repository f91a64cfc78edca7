//! Story Time — an illustrated, narrated storybook and chat companion for
//! young children.
//!
//! # Architecture
//!
//! ```text
//! egui UI (app.rs)
//!    │  StoryCommand (mpsc)
//!    ▼
//! StoryRunner::run()            ← async tokio task
//!    ├─ gen::ApiBackend         story text / illustrations / narration / chat
//!    ├─ story::PageStore        page records + current index (generation-stamped)
//!    ├─ story::PlaybackController  exclusive read-aloud playback
//!    └─ chat::ChatSession       chat transcript
//!    │  StoryEvent (mpsc)
//!    ▼
//! egui UI renders snapshots each frame
//!
//! audio-playout thread (audio::output) owns the cpal output stream and
//! reports end-of-clip tokens back to the runner.
//! ```

pub mod app;
pub mod audio;
pub mod chat;
pub mod config;
pub mod gen;
pub mod story;

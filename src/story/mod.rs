//! Story core — page records, asset loading, playback, and the orchestrator.
//!
//! # Architecture
//!
//! ```text
//! StoryCommand (mpsc)
//!        │
//!        ▼
//! StoryRunner::run()  ← async tokio task
//!        │
//!        ├─ CreateStory  → spawn story_pages → PageStore::replace_all
//!        ├─ Next/PrevPage → stop playback → clamp index → lazy asset load
//!        ├─ TogglePlayback → PlaybackController (Idle ⇄ Playing)
//!        └─ SendChat / NewChat → ChatSession
//!        │
//! spawned loads → load_page_assets (image ∥ narration, join) →
//!   PageStore::apply_assets (generation-stamped; stale results discarded)
//!        │
//! StoryEvent (mpsc) ──▶ read by the egui app every frame
//! ```

pub mod assets;
pub mod page;
pub mod playback;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use assets::{load_page_assets, AssetOutcome};
pub use page::{AssetUpdate, PageStore, StoryPage};
pub use playback::{
    CommandSink, PlaybackChange, PlaybackController, PlaybackPhase, PlaybackSink, SilentSink,
};
pub use runner::{PageView, StoryCommand, StoryEvent, StoryRunner};

//! Generation collaborators for Story Time.
//!
//! This module provides:
//! * [`StoryBackend`] — async trait over the four generation calls
//!   (story pages, illustration, narration, chat reply).
//! * [`ApiBackend`] — REST backend speaking the Gemini-style wire format.
//! * [`GenError`] — error variants for generation operations.
//! * [`prompt`] — the prompt text for each task.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use story_time::config::AppConfig;
//! use story_time::gen::{ApiBackend, StoryBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let backend: Arc<dyn StoryBackend> = Arc::new(ApiBackend::from_config(&config));
//!
//!     let pages = backend.story_pages("a friendly dragon").await.unwrap();
//!     println!("{} pages", pages.len());
//! }
//! ```

pub mod api;
pub mod backend;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use api::ApiBackend;
pub use backend::{GenError, StoryBackend};

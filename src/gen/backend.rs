//! Core `StoryBackend` trait and error type.
//!
//! The backend is the seam between the story/chat logic and the generation
//! service: story text, illustrations, narration audio, and chat replies are
//! all requested through it, so tests can substitute doubles and the rest of
//! the crate never touches HTTP directly.

use async_trait::async_trait;
use thiserror::Error;

use crate::chat::ChatTurn;

// ---------------------------------------------------------------------------
// GenError
// ---------------------------------------------------------------------------

/// Errors that can occur during a generation call.
#[derive(Debug, Error)]
pub enum GenError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// The response carried no usable payload (no text, no image bytes, no
    /// audio data).
    #[error("generation returned an empty response")]
    Empty,
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenError::Timeout
        } else {
            GenError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// StoryBackend trait
// ---------------------------------------------------------------------------

/// Async trait over the four generation collaborators.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn StoryBackend>`).
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Generate the ordered page texts for a story about `topic`.
    ///
    /// A successful result is always non-empty.
    async fn story_pages(&self, topic: &str) -> Result<Vec<String>, GenError>;

    /// Generate an illustration for one page and return an image reference
    /// (a `data:image/png;base64,…` URL).
    async fn illustration(&self, page_text: &str) -> Result<String, GenError>;

    /// Synthesize narration for one page and return the raw PCM bytes
    /// (signed 16-bit little-endian, mono, 24 000 Hz).
    async fn narration(&self, page_text: &str) -> Result<Vec<u8>, GenError>;

    /// Produce the companion's reply to `message`, given the transcript so
    /// far.  Transcript state is owned by [`crate::chat::ChatSession`]; this
    /// call is stateless.
    async fn chat_reply(&self, turns: &[ChatTurn], message: &str) -> Result<String, GenError>;
}

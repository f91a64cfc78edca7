//! Prompt construction for the four generation tasks.
//!
//! Each builder returns the full text sent to the model for one request:
//! story pages, an illustration, narration speech, or a chat turn.  Keeping
//! the wording in one place makes the register ("friendly, for a young
//! child") consistent across tasks and easy to tune.

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

/// Persona instruction for the chat companion.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "\
You are a friendly, curious, and patient robot friend named Sparky. \
You are talking to a young child. Keep your answers simple, short, and \
encouraging. Use simple words and lots of happy emojis.";

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Prompt for generating the story pages.
///
/// The model is instructed to answer with a JSON array of strings so the
/// response can be parsed without scraping; the response schema sent
/// alongside the request enforces the same shape.
pub fn story_prompt(topic: &str, page_count: usize) -> String {
    format!(
        "You are a creative storyteller for children aged 4-7. Generate a \
         short, happy story about \"{topic}\" with {page_count} pages. Each \
         page should be a short paragraph. Respond ONLY with a JSON array of \
         strings, where each string is a page of the story."
    )
}

/// Prompt for illustrating one page.
pub fn illustration_prompt(page_text: &str) -> String {
    format!(
        "A whimsical, colorful, simple, and happy illustration for a \
         children's storybook page. The style should be like a cartoon or a \
         gentle watercolor painting. The illustration should depict: \
         \"{page_text}\""
    )
}

/// Prompt for narrating one page aloud.
pub fn narration_prompt(page_text: &str) -> String {
    format!("Say it in a friendly, cheerful, and gentle voice for a child: {page_text}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

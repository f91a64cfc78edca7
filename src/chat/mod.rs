//! Chat companion session.
//!
//! [`ChatSession`] owns the transcript of one conversation with the
//! companion.  It is an explicit value — callers create one at startup,
//! replace it with [`ChatSession::new`] to start over, and pass its turns to
//! [`StoryBackend::chat_reply`](crate::gen::StoryBackend::chat_reply) on each
//! send.  A failed send records nothing, so the transcript survives
//! transient errors untouched.

// ---------------------------------------------------------------------------
// Role / ChatTurn
// ---------------------------------------------------------------------------

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The child using the app.
    User,
    /// The companion.
    Model,
}

impl Role {
    /// Wire name used by the generation API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// Ordered transcript of one chat conversation.
///
/// # Example
/// ```rust
/// use story_time::chat::ChatSession;
///
/// let mut session = ChatSession::new();
/// session.record_exchange("hi!".into(), "Hello friend! 🤖".into());
/// assert_eq!(session.turns().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    /// Start a fresh session with an empty transcript.
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// The transcript so far, oldest first.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// True when nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a completed user → model exchange.
    ///
    /// Called only after the backend produced a reply; a failed send must
    /// not alter the transcript.
    pub fn record_exchange(&mut self, message: String, reply: String) {
        self.turns.push(ChatTurn {
            role: Role::User,
            text: message,
        });
        self.turns.push(ChatTurn {
            role: Role::Model,
            text: reply,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

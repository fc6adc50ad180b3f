//! Dialog state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on poll answers; reaching it forces the options menu
pub const MAX_POLL_ANSWERS: usize = 10;

/// Minimum number of answers before a poll may be published
pub const MIN_POLL_ANSWERS: usize = 2;

/// Platform limit for a poll question
pub const MAX_POLL_QUESTION_CHARS: usize = 300;

/// Platform limit for a single poll answer
pub const MAX_POLL_ANSWER_CHARS: usize = 100;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable key of the chat a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a message previously sent into a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

// ============================================================================
// Dialog State
// ============================================================================

/// Where a user currently is in a wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    /// Main menu, no wizard in progress
    #[default]
    Start,
    /// Waiting for a shared location
    Location,
    BaseCurrency,
    TargetCurrency,
    /// Waiting for the amount to convert
    CurrencyAmount,
    PollChatId,
    PollQuestion,
    /// Collecting poll answers one message at a time
    PollAnswer,
    /// Poll flags menu, waiting for toggles or "create"
    PollOptions,
}

impl DialogState {
    pub fn is_start(self) -> bool {
        self == DialogState::Start
    }
}

// ============================================================================
// Session
// ============================================================================

/// Fields collected across turns of the current wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFields {
    pub base_currency: Option<String>,
    pub target_currency: Option<String>,
    pub amount: Option<f64>,
    pub poll_chat_id: Option<String>,
    pub poll_question: Option<String>,
    #[serde(default)]
    pub poll_answers: Vec<String>,
    #[serde(default)]
    pub poll_is_anonymous: bool,
    #[serde(default)]
    pub poll_allows_multiple_answers: bool,
}

impl SessionFields {
    /// Fields for a fresh poll wizard targeting `chat_id`
    pub fn poll_draft(chat_id: impl Into<String>) -> Self {
        Self {
            poll_chat_id: Some(chat_id.into()),
            poll_is_anonymous: true,
            poll_allows_multiple_answers: false,
            poll_answers: Vec::new(),
            ..Self::default()
        }
    }
}

/// Per-user dialog session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub state: DialogState,
    pub fields: SessionFields,
}

impl Session {
    /// The initial session: `Start` with no collected fields
    pub fn start() -> Self {
        Self::default()
    }

    pub fn new(state: DialogState, fields: SessionFields) -> Self {
        Self { state, fields }
    }

    /// Same fields, different state
    #[cfg(test)]
    pub fn with_state(&self, state: DialogState) -> Self {
        Self {
            state,
            fields: self.fields.clone(),
        }
    }
}

// ============================================================================
// Poll Draft
// ============================================================================

/// Everything needed to publish a poll, assembled from session fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDraft {
    pub chat_id: String,
    pub question: String,
    pub answers: Vec<String>,
    pub is_anonymous: bool,
    pub allows_multiple_answers: bool,
}

// ============================================================================
// Chat Context
// ============================================================================

/// Context for a chat (immutable apart from the sender's display name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    pub chat_id: ChatId,
    /// First name of the user, used in greetings
    pub user_name: Option<String>,
}

impl ChatContext {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            user_name: None,
        }
    }

    #[cfg(test)]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

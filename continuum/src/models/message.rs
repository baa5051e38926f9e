//! Transcript model representing one displayed line of a conversation.

use serde::{Deserialize, Serialize};

/// Role of a transcript item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

impl Role {
    /// Convert role to its wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse role from a wire string.
    ///
    /// Roles the transcript cannot display (`system`, `developer`) yield `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single displayed item of a transcript.
///
/// Items are never mutated once pushed; `sequence` is their display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptItem {
    /// Who said it.
    pub role: Role,
    /// Displayable text.
    pub text: String,
    /// Position in the transcript.
    pub sequence: usize,
}

/// Ordered, append-only list of transcript items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    items: Vec<TranscriptItem>,
}

impl Transcript {
    /// Create an empty transcript.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an item, assigning it the next sequence number.
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        let sequence = self.items.len();
        self.items.push(TranscriptItem {
            role,
            text: text.into(),
            sequence,
        });
    }

    /// Items in display order.
    pub fn items(&self) -> &[TranscriptItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

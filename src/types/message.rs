use serde::{Deserialize, Serialize};

/// A single role-tagged message in a conversation.
///
/// Messages are never edited in place; replacing a message means constructing a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The role of the message.
    pub role: MessageRole,

    /// The text of the message.
    pub content: String,
}

/// Role type for a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System role.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl MessageRole {
    /// Returns the opposite conversational role.
    ///
    /// System messages have no counterpart and map to themselves.
    pub fn inverted(self) -> Self {
        match self {
            MessageRole::System => MessageRole::System,
            MessageRole::User => MessageRole::Assistant,
            MessageRole::Assistant => MessageRole::User,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl Message {
    /// Create a new `Message` with the given content and role.
    pub fn new(content: impl Into<String>, role: MessageRole) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system `Message`.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::System)
    }

    /// Create a new user `Message`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::User)
    }

    /// Create a new assistant `Message`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::Assistant)
    }

    /// True if this is a system message.
    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }

    /// True if this is a user message.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// The same text as seen from the other side of the conversation.
    pub fn inverted(&self) -> Self {
        Self::new(self.content.clone(), self.role.inverted())
    }
}

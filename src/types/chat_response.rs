use serde::{Deserialize, Serialize};

use crate::types::Message;

/// One object returned by the chat route.
///
/// Non-streaming requests receive a single chunk with `done` set.  Streaming requests
/// receive one chunk per line, each carrying a fragment of the assistant's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatChunk {
    /// The model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The (partial) assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// True on the final chunk.
    #[serde(default)]
    pub done: bool,

    /// Set when the endpoint fails after the stream has started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatChunk {
    /// The text carried by this chunk, or the empty string.
    pub fn text(&self) -> &str {
        self.message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_deserialization() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"model":"llama3.2","created_at":"2024-01-01T00:00:00Z","message":{"role":"assistant","content":"Hel"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(chunk.text(), "Hel");
        assert!(!chunk.done);
        assert_eq!(chunk.model.as_deref(), Some("llama3.2"));
    }

    #[test]
    fn final_chunk_without_message() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert_eq!(chunk.text(), "");
        assert!(chunk.done);
    }

    #[test]
    fn error_body() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"model \"x\" not found"}"#).unwrap();
        assert!(body.error.contains("not found"));
    }
}

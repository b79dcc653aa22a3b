use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body of a request to the endpoint's chat route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The model to generate with.
    pub model: String,

    /// The conversation so far, oldest first.
    pub messages: Vec<Message>,

    /// Whether the endpoint should stream newline-delimited chunks.
    pub stream: bool,
}

impl ChatRequest {
    /// Create a request that returns the whole response at once.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }

    /// Create a request that streams the response.
    pub fn new_streaming(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            stream: true,
            ..Self::new(model, messages)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn streaming_request_serialization() {
        let request = ChatRequest::new_streaming(
            "llama3.2",
            vec![Message::system("Be kind."), Message::user("Hi")],
        );
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "model": "llama3.2",
                "messages": [
                    {"role": "system", "content": "Be kind."},
                    {"role": "user", "content": "Hi"}
                ],
                "stream": true
            })
        );
    }

    #[test]
    fn non_streaming_by_default() {
        let request = ChatRequest::new("llama3.2", vec![]);
        assert!(!request.stream);
    }
}

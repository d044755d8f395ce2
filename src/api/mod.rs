//! Wire payloads shared by the provider adapters and the proxy.
//!
//! Two dialects are spoken: the Ollama-style `/api/chat` shape used by the
//! local backend, and the OpenAI-style `/chat/completions` shape used by the
//! hosted one. Both carry the same `role`/`content` message objects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Request body for an Ollama-style `POST {base}/api/chat`.
///
/// `stream` is always sent as `false`; the client consumes complete replies
/// only.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[derive(Debug, Serialize)]
pub struct ChatOptions {
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for an OpenAI-style `POST {base}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_requests_serialize_to_the_ollama_shape() {
        let request = ChatRequest {
            model: "llama3.2".to_string(),
            messages: vec![ChatMessage::new("user", "Hi")],
            stream: false,
            options: ChatOptions { temperature: 0.7 },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "llama3.2",
                "messages": [{"role": "user", "content": "Hi"}],
                "stream": false,
                "options": {"temperature": 0.7}
            })
        );
    }

    #[test]
    fn chat_responses_tolerate_missing_fields() {
        let parsed: ChatResponse = serde_json::from_value(json!({"done": true})).unwrap();
        assert!(parsed.message.is_none());

        let parsed: ChatResponse =
            serde_json::from_value(json!({"message": {"role": "assistant"}})).unwrap();
        assert!(parsed.message.unwrap().content.is_none());
    }

    #[test]
    fn completion_responses_expose_the_first_choice() {
        let parsed: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
        }))
        .unwrap();
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        assert_eq!(content.as_deref(), Some("Hello!"));
    }
}

//! Adapter for a locally served, Ollama-compatible backend.

use async_trait::async_trait;
use tracing::debug;

use crate::api::{ChatMessage, ChatOptions, ChatRequest, ChatResponse};
use crate::core::constants::{DEFAULT_LOCAL_BASE_URL, DEFAULT_LOCAL_MODEL, DEFAULT_TEMPERATURE};
use crate::providers::{ChatProvider, DeliveryError};
use crate::utils::url::endpoint_url;

pub struct LocalServerProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl LocalServerProvider {
    /// Build the adapter from optional settings. Missing or blank values
    /// fall back to the documented defaults, so the request body never
    /// carries an empty model name.
    pub fn new(client: reqwest::Client, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client,
            base_url: non_blank(base_url).unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string()),
            model: non_blank(model).unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatProvider for LocalServerProvider {
    fn name(&self) -> &'static str {
        "local-server"
    }

    async fn send(&self, context: &[ChatMessage]) -> Result<String, DeliveryError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: context.to_vec(),
            stream: false,
            options: ChatOptions {
                temperature: DEFAULT_TEMPERATURE,
            },
        };
        let url = endpoint_url(&self.base_url, "api/chat");
        debug!(%url, model = %self.model, messages = context.len(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(DeliveryError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(DeliveryError::Backend {
                status: Some(status.as_u16()),
                detail: backend_detail(&body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(DeliveryError::from_transport)?;

        parsed
            .message
            .and_then(|message| message.content)
            .ok_or_else(|| DeliveryError::Backend {
                status: None,
                detail: "the reply did not include message.content".to_string(),
            })
    }
}

/// Pull the `error` field out of an Ollama error body, falling back to the
/// raw text when the body is not the expected JSON.
fn backend_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|detail| detail.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "<no body>".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FailureKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> LocalServerProvider {
        LocalServerProvider::new(reqwest::Client::new(), Some(server.uri()), None)
    }

    #[test]
    fn blank_settings_fall_back_to_defaults() {
        let provider =
            LocalServerProvider::new(reqwest::Client::new(), Some("   ".to_string()), None);
        assert_eq!(provider.base_url(), DEFAULT_LOCAL_BASE_URL);
        assert_eq!(provider.model(), DEFAULT_LOCAL_MODEL);
    }

    #[tokio::test]
    async fn sends_the_exact_wire_shape_and_returns_the_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "model": "llama3.2",
                "messages": [{"role": "user", "content": "Hi"}],
                "stream": false,
                "options": {"temperature": 0.7}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "Hello!"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let reply = provider
            .send(&[ChatMessage::new("user", "Hi")])
            .await
            .unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn non_success_statuses_become_backend_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string(r#"{"error":"model 'llama3.2' not found"}"#),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .send(&[ChatMessage::new("user", "Hi")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Backend);
        match err {
            DeliveryError::Backend { status, detail } => {
                assert_eq!(status, Some(500));
                assert!(detail.contains("not found"), "unexpected detail: {detail}");
            }
            other => panic!("expected a backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn replies_without_content_are_backend_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .send(&[ChatMessage::new("user", "Hi")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Backend);
        assert!(err.to_string().contains("message.content"));
    }

    #[tokio::test]
    async fn unreachable_servers_are_connectivity_errors() {
        // Bind and immediately drop a listener so the port is almost
        // certainly closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let provider = LocalServerProvider::new(
            reqwest::Client::new(),
            Some(format!("http://127.0.0.1:{port}")),
            None,
        );
        let err = provider
            .send(&[ChatMessage::new("user", "Hi")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Connectivity);
    }
}

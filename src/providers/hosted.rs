//! Adapter for a hosted chat-completions API.
//!
//! This adapter never fails a send. When the backend cannot be used, for any
//! reason, it answers from the offline responder instead, after a short
//! artificial delay so the reply does not arrive implausibly fast. The
//! degradation is logged; the caller only ever sees a successful reply.

use async_trait::async_trait;
use tracing::warn;

use crate::api::{ChatMessage, CompletionRequest, CompletionResponse};
use crate::core::constants::{DEFAULT_HOSTED_BASE_URL, DEFAULT_HOSTED_MODEL, DEFAULT_TEMPERATURE};
use crate::core::fallback::{offline_reply, SIMULATED_LATENCY};
use crate::providers::{ChatProvider, DeliveryError};
use crate::utils::url::endpoint_url;

/// Persona instruction sent ahead of every hosted conversation.
const SYSTEM_INSTRUCTION: &str = "You are a friendly companion chatting in a messaging app. \
Keep your replies casual, helpful, and concise. Use emoji occasionally.";

/// Environment variable the API key is read from.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct HostedProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HostedProvider {
    /// Build the adapter from optional settings, reading the API key from
    /// the environment. Missing or blank values fall back to the documented
    /// defaults.
    pub fn new(client: reqwest::Client, base_url: Option<String>, model: Option<String>) -> Self {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self {
            client,
            base_url: non_blank(base_url).unwrap_or_else(|| DEFAULT_HOSTED_BASE_URL.to_string()),
            model: non_blank(model).unwrap_or_else(|| DEFAULT_HOSTED_MODEL.to_string()),
            api_key,
        }
    }

    /// Supply the API key directly instead of reading the environment.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_backend(&self, context: &[ChatMessage]) -> Result<String, DeliveryError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DeliveryError::Configuration(format!("no API key is set; export {API_KEY_ENV}"))
        })?;

        let mut messages = Vec::with_capacity(context.len() + 1);
        messages.push(ChatMessage::new("system", SYSTEM_INSTRUCTION));
        messages.extend_from_slice(context);

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
        };
        let url = endpoint_url(&self.base_url, "chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
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
                detail: body.trim().to_string(),
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(DeliveryError::from_transport)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DeliveryError::Backend {
                status: None,
                detail: "the reply did not include any choices".to_string(),
            })
    }
}

#[async_trait]
impl ChatProvider for HostedProvider {
    fn name(&self) -> &'static str {
        "hosted"
    }

    async fn send(&self, context: &[ChatMessage]) -> Result<String, DeliveryError> {
        match self.call_backend(context).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                warn!(error = %err, "hosted backend failed, answering offline");
                tokio::time::sleep(SIMULATED_LATENCY).await;
                let outbound = context
                    .iter()
                    .rev()
                    .find(|message| message.role == "user")
                    .map(|message| message.content.as_str())
                    .unwrap_or("");
                Ok(offline_reply(outbound))
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! The delivery orchestrator.
//!
//! One orchestrator owns one provider adapter for the lifetime of a session.
//! The adapter is selected exactly once, from explicit settings; there is no
//! ambient configuration and no mid-session switching. Every non-blank send
//! produces exactly one [`DeliveryOutcome`], success or failure, and sends
//! are serialized so a second message waits for the first to finish.

use std::fmt;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::ChatMessage;
use crate::core::config::data::Settings;
use crate::core::constants::CONTEXT_WINDOW_MESSAGES;
use crate::core::conversation::Conversation;
use crate::providers::builtin::BuiltinProvider;
use crate::providers::hosted::HostedProvider;
use crate::providers::local::LocalServerProvider;
use crate::providers::{ChatProvider, DeliveryError, ProviderKind};

/// The single result of a delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// The provider answered; this is the reply text.
    Success(String),
    /// The provider could not answer; the error says why.
    Failure(DeliveryError),
}

impl DeliveryOutcome {
    /// The text the presentation layer appends to the thread. Diagnostics
    /// render inline exactly like replies, so both arms produce plain text.
    pub fn thread_text(&self) -> String {
        match self {
            DeliveryOutcome::Success(text) => text.clone(),
            DeliveryOutcome::Failure(err) => err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success(_))
    }
}

pub struct Orchestrator {
    provider: Box<dyn ChatProvider>,
    // Serializes sends. Lock order: acquired only here, held across the
    // provider call.
    send_gate: Mutex<()>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Select and construct the provider adapter from settings.
    ///
    /// This is the only place a provider is chosen. An unset kind means
    /// `local`; an unrecognized kind fails here, before any message can be
    /// sent. Model and base URL are handed to the adapter at construction,
    /// so nothing re-reads settings later.
    pub fn from_settings(
        settings: &Settings,
        client: reqwest::Client,
    ) -> Result<Self, DeliveryError> {
        let kind = match settings.provider_hint() {
            Some(raw) => raw.parse::<ProviderKind>()?,
            None => ProviderKind::Local,
        };
        let base_url = settings.base_url_hint().map(str::to_string);
        let model = settings.model_hint().map(str::to_string);

        let provider: Box<dyn ChatProvider> = match kind {
            ProviderKind::Local => Box::new(LocalServerProvider::new(client, base_url, model)),
            ProviderKind::Hosted => Box::new(HostedProvider::new(client, base_url, model)),
            ProviderKind::Builtin => Box::new(BuiltinProvider::detected()),
        };
        Ok(Self::with_provider(provider))
    }

    /// Wrap an already-built adapter. Used directly in tests.
    pub fn with_provider(provider: Box<dyn ChatProvider>) -> Self {
        Self {
            provider,
            send_gate: Mutex::new(()),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Deliver one outbound message.
    ///
    /// Blank input is a no-op and returns `None`: nothing is sent, nothing
    /// is appended, no outcome exists. Otherwise the provider gets the last
    /// [`CONTEXT_WINDOW_MESSAGES`] stored messages plus the outbound text,
    /// makes its single attempt, and the result comes back as exactly one
    /// outcome. `history` is the thread as it stood before this message; the
    /// caller appends the user message and the outcome afterwards.
    pub async fn deliver(&self, history: &Conversation, text: &str) -> Option<DeliveryOutcome> {
        let outbound = text.trim();
        if outbound.is_empty() {
            return None;
        }

        let _in_flight = self.send_gate.lock().await;
        let context = build_context(history, outbound);
        debug!(
            provider = self.provider.name(),
            window = context.len(),
            "delivering message"
        );

        let outcome = match self.provider.send(&context).await {
            Ok(reply) => DeliveryOutcome::Success(reply),
            Err(err) => {
                warn!(provider = self.provider.name(), error = %err, "delivery failed");
                DeliveryOutcome::Failure(err)
            }
        };
        Some(outcome)
    }
}

/// The trailing window of history plus the outbound text, oldest first.
/// Stored roles are already canonical, so `model`-labelled replies have
/// long since collapsed into `assistant` by the time they get here.
fn build_context(history: &Conversation, outbound: &str) -> Vec<ChatMessage> {
    let recent = history.recent(CONTEXT_WINDOW_MESSAGES);
    let mut context = Vec::with_capacity(recent.len() + 1);
    for message in recent {
        context.push(ChatMessage::new(message.role.as_str(), message.content.clone()));
    }
    context.push(ChatMessage::new("user", outbound));
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FailureKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    #[derive(Clone)]
    struct RecordingProvider {
        calls: Arc<StdMutex<Vec<Vec<ChatMessage>>>>,
        reply: Result<String, DeliveryError>,
    }

    impl RecordingProvider {
        fn succeeding(reply: &str) -> Self {
            Self {
                calls: Arc::new(StdMutex::new(Vec::new())),
                reply: Ok(reply.to_string()),
            }
        }

        fn failing(err: DeliveryError) -> Self {
            Self {
                calls: Arc::new(StdMutex::new(Vec::new())),
                reply: Err(err),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for RecordingProvider {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, context: &[ChatMessage]) -> Result<String, DeliveryError> {
            self.calls.lock().unwrap().push(context.to_vec());
            self.reply.clone()
        }
    }

    /// Holds every send until released, and tracks how many ran at once.
    struct BlockingProvider {
        release: Arc<Notify>,
        started: Arc<AtomicUsize>,
        concurrent: Arc<AtomicUsize>,
        max_concurrent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatProvider for BlockingProvider {
        fn name(&self) -> &'static str {
            "blocking"
        }

        async fn send(&self, _context: &[ChatMessage]) -> Result<String, DeliveryError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);
            self.release.notified().await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
            Ok("done".to_string())
        }
    }

    fn seeded(count: usize) -> Conversation {
        let mut conversation = Conversation::new();
        for i in 0..count {
            if i % 2 == 0 {
                conversation.push_user(format!("m{i}"));
            } else {
                conversation.push_assistant(format!("m{i}"));
            }
        }
        conversation
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let provider = RecordingProvider::succeeding("unused");
        let calls = provider.calls.clone();
        let orchestrator = Orchestrator::with_provider(Box::new(provider));

        assert_eq!(orchestrator.deliver(&Conversation::new(), "").await, None);
        assert_eq!(
            orchestrator.deliver(&Conversation::new(), "   \n\t").await,
            None
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn the_window_is_the_last_fifteen_messages_plus_the_outbound() {
        let provider = RecordingProvider::succeeding("reply");
        let calls = provider.calls.clone();
        let orchestrator = Orchestrator::with_provider(Box::new(provider));
        let conversation = seeded(20);

        let outcome = orchestrator
            .deliver(&conversation, "newest question")
            .await
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Success("reply".to_string()));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let payload = &calls[0];
        assert_eq!(payload.len(), CONTEXT_WINDOW_MESSAGES + 1);
        // Truncated from the head: m0..m4 are gone.
        assert_eq!(payload[0].content, "m5");
        assert_eq!(payload[CONTEXT_WINDOW_MESSAGES - 1].content, "m19");
        let last = &payload[CONTEXT_WINDOW_MESSAGES];
        assert_eq!(last.role, "user");
        assert_eq!(last.content, "newest question");
    }

    #[tokio::test]
    async fn short_threads_send_everything() {
        let provider = RecordingProvider::succeeding("reply");
        let calls = provider.calls.clone();
        let orchestrator = Orchestrator::with_provider(Box::new(provider));
        let conversation = seeded(4);

        orchestrator.deliver(&conversation, "hi").await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].len(), 5);
        assert_eq!(calls[0][0].content, "m0");
    }

    #[tokio::test]
    async fn stored_roles_map_onto_the_wire_vocabulary() {
        let provider = RecordingProvider::succeeding("reply");
        let calls = provider.calls.clone();
        let orchestrator = Orchestrator::with_provider(Box::new(provider));
        let mut conversation = Conversation::new();
        conversation.push_user("question");
        conversation.push_assistant("answer");

        orchestrator.deliver(&conversation, "next").await.unwrap();

        let calls = calls.lock().unwrap();
        let roles: Vec<&str> = calls[0].iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn outbound_text_is_trimmed_before_sending() {
        let provider = RecordingProvider::succeeding("reply");
        let calls = provider.calls.clone();
        let orchestrator = Orchestrator::with_provider(Box::new(provider));

        orchestrator
            .deliver(&Conversation::new(), "  hello  ")
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0][0].content, "hello");
    }

    #[tokio::test]
    async fn provider_errors_become_failure_outcomes() {
        let provider = RecordingProvider::failing(DeliveryError::Backend {
            status: Some(500),
            detail: "boom".to_string(),
        });
        let orchestrator = Orchestrator::with_provider(Box::new(provider));

        let outcome = orchestrator
            .deliver(&Conversation::new(), "hi")
            .await
            .unwrap();
        match &outcome {
            DeliveryOutcome::Failure(err) => {
                assert_eq!(err.kind(), FailureKind::Backend);
                assert!(outcome.thread_text().contains("500"));
            }
            DeliveryOutcome::Success(text) => panic!("expected a failure, got: {text}"),
        }
    }

    #[tokio::test]
    async fn concurrent_sends_queue_behind_each_other() {
        let release = Arc::new(Notify::new());
        let started = Arc::new(AtomicUsize::new(0));
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_concurrent = Arc::new(AtomicUsize::new(0));
        let orchestrator = Arc::new(Orchestrator::with_provider(Box::new(BlockingProvider {
            release: release.clone(),
            started: started.clone(),
            concurrent: concurrent.clone(),
            max_concurrent: max_concurrent.clone(),
        })));

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.deliver(&Conversation::new(), "first").await }
        });
        // Wait for the first send to reach the provider.
        while started.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.deliver(&Conversation::new(), "second").await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        // The second send must still be queued, not in the provider.
        assert_eq!(started.load(Ordering::SeqCst), 1);

        release.notify_one();
        let first = timeout(Duration::from_secs(5), first)
            .await
            .expect("first send timed out")
            .unwrap();
        release.notify_one();
        let second = timeout(Duration::from_secs(5), second)
            .await
            .expect("second send timed out")
            .unwrap();

        assert_eq!(first, Some(DeliveryOutcome::Success("done".to_string())));
        assert_eq!(second, Some(DeliveryOutcome::Success("done".to_string())));
        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert_eq!(max_concurrent.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_provider_kinds_fail_at_selection_time() {
        let settings = Settings {
            provider: Some("carrier-pigeon".to_string()),
            ..Default::default()
        };
        let err = Orchestrator::from_settings(&settings, reqwest::Client::new()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn an_unset_provider_means_local() {
        let orchestrator =
            Orchestrator::from_settings(&Settings::default(), reqwest::Client::new()).unwrap();
        assert_eq!(orchestrator.provider_name(), "local-server");
    }

    #[test]
    fn a_blank_provider_also_means_local() {
        let settings = Settings {
            provider: Some("  ".to_string()),
            ..Default::default()
        };
        let orchestrator = Orchestrator::from_settings(&settings, reqwest::Client::new()).unwrap();
        assert_eq!(orchestrator.provider_name(), "local-server");
    }

    #[test]
    fn each_kind_selects_its_adapter() {
        for (raw, expected) in [
            ("local", "local-server"),
            ("hosted", "hosted"),
            ("builtin", "builtin"),
        ] {
            let settings = Settings {
                provider: Some(raw.to_string()),
                ..Default::default()
            };
            let orchestrator =
                Orchestrator::from_settings(&settings, reqwest::Client::new()).unwrap();
            assert_eq!(orchestrator.provider_name(), expected);
        }
    }
}

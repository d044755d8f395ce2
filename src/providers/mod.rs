//! Provider adapters for the chat backends.
//!
//! One adapter exists per backend kind, all behind [`ChatProvider`]. The
//! orchestrator selects a single adapter at startup and never switches
//! mid-session. Adapters make exactly one attempt per send; anything that
//! goes wrong surfaces as a [`DeliveryError`] rather than a retry.

pub mod builtin;
pub mod hosted;
pub mod local;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::api::ChatMessage;

/// Which backend a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A locally served Ollama-compatible backend.
    Local,
    /// A hosted chat-completions API.
    Hosted,
    /// An on-device model runtime, when the platform ships one.
    Builtin,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Hosted => "hosted",
            ProviderKind::Builtin => "builtin",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DeliveryError;

    /// Parse a configured provider kind. A few legacy spellings from older
    /// settings files are accepted, but anything unrecognized is a
    /// configuration error: a typo must fail fast at startup, not fall back
    /// to some provider the user did not ask for.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(ProviderKind::Local),
            "hosted" | "remote" => Ok(ProviderKind::Hosted),
            "builtin" | "on-device" => Ok(ProviderKind::Builtin),
            other => Err(DeliveryError::Configuration(format!(
                "unknown provider kind '{other}' (expected local, hosted, or builtin)"
            ))),
        }
    }
}

/// Coarse category of a delivery failure, for routing and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Connectivity,
    Backend,
    Capability,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Connectivity => "connectivity",
            FailureKind::Backend => "backend",
            FailureKind::Capability => "capability",
        }
    }
}

/// Why a send produced no model reply.
///
/// The `Display` text doubles as the inline diagnostic shown in the thread,
/// so every variant renders as a complete, user-readable sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// Settings are missing or unusable. Raised before any network traffic.
    Configuration(String),
    /// The backend could not be reached at all.
    Connectivity(String),
    /// The backend was reached but did not produce a usable reply.
    Backend {
        /// HTTP status when the backend answered with one; `None` for
        /// malformed bodies on an otherwise successful exchange.
        status: Option<u16>,
        detail: String,
    },
    /// The on-device runtime is absent or not ready.
    Capability(String),
}

impl DeliveryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DeliveryError::Configuration(_) => FailureKind::Configuration,
            DeliveryError::Connectivity(_) => FailureKind::Connectivity,
            DeliveryError::Backend { .. } => FailureKind::Backend,
            DeliveryError::Capability(_) => FailureKind::Capability,
        }
    }

    /// Map a transport-level failure onto the taxonomy. Timeouts and refused
    /// connections are connectivity problems; a body that fails to decode
    /// means the backend answered with something unusable.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Connectivity(format!("the request timed out: {err}"))
        } else if err.is_decode() {
            DeliveryError::Backend {
                status: None,
                detail: format!("could not parse the response body: {err}"),
            }
        } else if err.is_builder() {
            DeliveryError::Configuration(format!("could not build the request: {err}"))
        } else {
            DeliveryError::Connectivity(err.to_string())
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Configuration(detail) => {
                write!(f, "Configuration problem: {detail}")
            }
            DeliveryError::Connectivity(detail) => {
                write!(
                    f,
                    "I couldn't reach the backend: {detail}. Check that the server is running and the base URL is right."
                )
            }
            DeliveryError::Backend {
                status: Some(status),
                detail,
            } => {
                write!(f, "The backend reported an error (HTTP {status}): {detail}")
            }
            DeliveryError::Backend {
                status: None,
                detail,
            } => {
                write!(f, "The backend sent back something I couldn't use: {detail}")
            }
            DeliveryError::Capability(detail) => {
                write!(f, "The on-device model isn't available: {detail}")
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

/// A backend adapter the orchestrator can hand one turn to.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short adapter name used in logs and the session banner.
    fn name(&self) -> &'static str;

    /// Send one context window and return the reply text.
    ///
    /// `context` is already windowed and ordered oldest-first, with the
    /// outbound message last. Implementations make a single attempt.
    async fn send(&self, context: &[ChatMessage]) -> Result<String, DeliveryError>;
}

//! Shared constants for the chat client.

/// Number of prior messages sent along with each outbound message.
///
/// The window is a pure truncation from the head of the conversation. The
/// outbound message itself is appended on top of this window, so a request
/// carries at most `CONTEXT_WINDOW_MESSAGES + 1` messages.
pub const CONTEXT_WINDOW_MESSAGES: usize = 15;

/// Sampling temperature sent with every chat request.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Conventional address of a locally served Ollama-compatible backend.
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";

/// Model requested from the local backend when none is configured.
pub const DEFAULT_LOCAL_MODEL: &str = "llama3.2";

/// Base URL of the hosted chat-completions API.
pub const DEFAULT_HOSTED_BASE_URL: &str = "https://api.openai.com/v1";

/// Model requested from the hosted API when none is configured.
pub const DEFAULT_HOSTED_MODEL: &str = "gpt-4o-mini";

/// Port the passthrough proxy listens on. Browser builds hardcode it.
pub const PROXY_PORT: u16 = 3001;

/// Timeout for a single outbound request. There are no retries, so this is
/// also the longest a send can stay in flight.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

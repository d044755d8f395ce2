//! Adapter for an on-device model runtime.
//!
//! Some platforms ship a local model as a host capability rather than a
//! server. The capability is probed through [`BuiltinRuntime`]; desktop and
//! server builds have no such runtime, so the stock probe reports it absent
//! and every send fails with a capability error that says so.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ChatMessage;
use crate::providers::{ChatProvider, DeliveryError};

/// What a probe learned about the on-device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// A session can be opened right away.
    Ready,
    /// The runtime exists but the model weights are still being fetched.
    Downloadable,
    /// No usable runtime on this host.
    Unavailable,
}

/// Host capability handle for an on-device model.
#[async_trait]
pub trait BuiltinRuntime: Send + Sync {
    /// Probe the capability without side effects. A probe that cannot
    /// determine the state reports [`Availability::Unavailable`].
    fn availability(&self) -> Availability;

    /// Open a session and run a single prompt. Only called after
    /// [`availability`](Self::availability) reported [`Availability::Ready`];
    /// the error string describes what went wrong inside the runtime.
    async fn prompt(&self, context: &[ChatMessage]) -> Result<String, String>;
}

/// Probe this host for an on-device runtime.
pub fn detect_runtime() -> Arc<dyn BuiltinRuntime> {
    Arc::new(AbsentRuntime)
}

/// The runtime on hosts that do not ship one.
struct AbsentRuntime;

#[async_trait]
impl BuiltinRuntime for AbsentRuntime {
    fn availability(&self) -> Availability {
        Availability::Unavailable
    }

    async fn prompt(&self, _context: &[ChatMessage]) -> Result<String, String> {
        Err("no on-device runtime is present".to_string())
    }
}

pub struct BuiltinProvider {
    runtime: Arc<dyn BuiltinRuntime>,
}

impl BuiltinProvider {
    pub fn new(runtime: Arc<dyn BuiltinRuntime>) -> Self {
        Self { runtime }
    }

    /// Build the adapter over whatever runtime this host ships.
    pub fn detected() -> Self {
        Self::new(detect_runtime())
    }
}

#[async_trait]
impl ChatProvider for BuiltinProvider {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn send(&self, context: &[ChatMessage]) -> Result<String, DeliveryError> {
        match self.runtime.availability() {
            Availability::Ready => self.runtime.prompt(context).await.map_err(|reason| {
                DeliveryError::Capability(format!("the on-device session failed: {reason}"))
            }),
            Availability::Downloadable => Err(DeliveryError::Capability(
                "the model is still downloading; try again once the download finishes".to_string(),
            )),
            Availability::Unavailable => Err(DeliveryError::Capability(
                "this platform has no on-device model; switch to the local or hosted provider"
                    .to_string(),
            )),
        }
    }
}

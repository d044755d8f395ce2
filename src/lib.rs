//! Confab is a terminal chat client for hosted and locally served LLM backends.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation store, persisted settings, the offline
//!   responder, and the delivery orchestrator that turns one outbound
//!   message into exactly one outcome.
//! - [`providers`] implements one adapter per backend kind (local server,
//!   hosted API, on-device runtime) behind a shared capability trait.
//! - [`proxy`] is the passthrough HTTP forwarder used by browser builds
//!   that cannot reach the model server directly.
//! - [`ui`] runs the interactive terminal session.
//! - [`api`] defines the wire payloads shared by the adapters and the proxy.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which owns settings loading and dispatches
//! into [`ui::run_chat`] or [`proxy::run`].

pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod proxy;
pub mod ui;
pub mod utils;

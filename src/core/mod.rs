pub mod config;
pub mod constants;
pub mod conversation;
pub mod fallback;
pub mod message;
pub mod orchestrator;

//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands. It is also the single owner of the settings file:
//! settings are loaded here once, command-line overrides are applied, and
//! the resulting value is passed down explicitly.

use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::core::config::data::Settings;
use crate::core::constants::{DEFAULT_LOCAL_BASE_URL, PROXY_PORT, REQUEST_TIMEOUT_SECS};
use crate::core::orchestrator::Orchestrator;
use crate::providers::hosted::API_KEY_ENV;
use crate::providers::ProviderKind;
use crate::proxy;
use crate::ui::run_chat;

#[derive(Parser)]
#[command(name = "confab")]
#[command(about = "A terminal chat client for hosted and locally served language models")]
#[command(
    long_about = "Confab is a terminal chat client. It talks to a locally served \
Ollama-compatible backend by default, and can be pointed at a hosted \
chat-completions API or an on-device model runtime instead.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    API key for the hosted provider\n\
  RUST_LOG          Log filter for diagnostics on stderr (e.g. confab=debug)\n\n\
Chat Commands:\n\
  /help             Show available commands\n\
  /log <filename>   Write a transcript to the specified file\n\
  /log              Toggle transcript pause/resume\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this session (overrides the saved setting)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Provider to use: local, hosted, or builtin (overrides the saved setting)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Base URL of the model server (overrides the saved setting)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write a transcript of the conversation to the specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Run the passthrough proxy for browser builds
    Proxy,
    /// Save a setting
    Set {
        /// Setting key: provider, model, base-url, bot-nickname, bot-avatar,
        /// or user-avatar. Omit to print the current settings.
        key: Option<String>,
        /// Value to save (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Clear a saved setting
    Unset {
        /// Setting key to clear
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let mut args = Args::parse();
    let settings_path = Settings::default_path()?;

    match args.command.take().unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let mut settings = Settings::load_from_path(&settings_path)?;
            apply_overrides(&mut settings, &args);

            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?;
            let orchestrator = match Orchestrator::from_settings(&settings, client) {
                Ok(orchestrator) => orchestrator,
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(2);
                }
            };
            if orchestrator.provider_name() == "hosted" && std::env::var(API_KEY_ENV).is_err() {
                eprintln!("⚠️  {API_KEY_ENV} is not set; hosted replies will fall back to canned offline responses.");
            }

            run_chat(settings, orchestrator, args.log).await
        }
        Commands::Proxy => {
            let addr = SocketAddr::from(([127, 0, 0, 1], PROXY_PORT));
            let upstream = args
                .base_url
                .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string());

            let shutdown = CancellationToken::new();
            let token = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            });

            proxy::run(addr, upstream, shutdown).await
        }
        Commands::Set { key, value } => handle_set(&settings_path, key, value),
        Commands::Unset { key } => handle_unset(&settings_path, &key),
    }
}

/// Session-scoped flag overrides. These are never written back to disk.
fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(model) = &args.model {
        settings.model = Some(model.clone());
    }
    if let Some(provider) = &args.provider {
        settings.provider = Some(provider.clone());
    }
    if let Some(base_url) = &args.base_url {
        settings.base_url = Some(base_url.clone());
    }
}

fn handle_set(path: &Path, key: Option<String>, value: Vec<String>) -> Result<(), Box<dyn Error>> {
    let mut settings = Settings::load_from_path(path)?;

    let Some(key) = key else {
        settings.print_all(path);
        return Ok(());
    };
    let value = value.join(" ").trim().to_string();
    if value.is_empty() {
        settings.print_all(path);
        return Ok(());
    }

    match key.as_str() {
        "provider" => {
            // Reject typos now rather than at the next chat startup.
            if let Err(err) = value.parse::<ProviderKind>() {
                eprintln!("❌ {err}");
                std::process::exit(1);
            }
            settings.provider = Some(value.clone());
        }
        "model" => settings.model = Some(value.clone()),
        "base-url" => settings.base_url = Some(value.clone()),
        "bot-nickname" => settings.profile.bot_nickname = value.clone(),
        "bot-avatar" => settings.profile.bot_avatar = value.clone(),
        "user-avatar" => settings.profile.user_avatar = value.clone(),
        _ => {
            eprintln!("❌ Unknown settings key: {key}");
            std::process::exit(1);
        }
    }

    settings.save_to_path(path)?;
    println!("✅ Set {key} to: {value}");
    Ok(())
}

fn handle_unset(path: &Path, key: &str) -> Result<(), Box<dyn Error>> {
    let mut settings = Settings::load_from_path(path)?;
    let defaults = Settings::default();

    match key {
        "provider" => settings.provider = None,
        "model" => settings.model = None,
        "base-url" => settings.base_url = None,
        "bot-nickname" => settings.profile.bot_nickname = defaults.profile.bot_nickname,
        "bot-avatar" => settings.profile.bot_avatar = defaults.profile.bot_avatar,
        "user-avatar" => settings.profile.user_avatar = defaults.profile.user_avatar,
        _ => {
            eprintln!("❌ Unknown settings key: {key}");
            std::process::exit(1);
        }
    }

    settings.save_to_path(path)?;
    println!("✅ Unset {key}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("confab=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_replace_what_was_passed() {
        let mut settings = Settings {
            provider: Some("local".to_string()),
            model: Some("llama3.2".to_string()),
            ..Default::default()
        };
        let args = Args {
            command: None,
            model: Some("qwen3".to_string()),
            provider: None,
            base_url: None,
            log: None,
        };

        apply_overrides(&mut settings, &args);

        assert_eq!(settings.model.as_deref(), Some("qwen3"));
        assert_eq!(settings.provider.as_deref(), Some("local"));
        assert_eq!(settings.base_url, None);
    }

    #[test]
    fn cli_parses_the_default_chat_invocation() {
        let args = Args::try_parse_from(["confab", "-m", "llama3.2", "-p", "local"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.model.as_deref(), Some("llama3.2"));
        assert_eq!(args.provider.as_deref(), Some("local"));
    }

    #[test]
    fn cli_parses_multi_word_set_values() {
        let args =
            Args::try_parse_from(["confab", "set", "bot-nickname", "Chatty", "McChatface"])
                .unwrap();
        match args.command {
            Some(Commands::Set { key, value }) => {
                assert_eq!(key.as_deref(), Some("bot-nickname"));
                assert_eq!(value, vec!["Chatty".to_string(), "McChatface".to_string()]);
            }
            _ => panic!("expected a set command"),
        }
    }
}

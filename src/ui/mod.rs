//! The interactive terminal session.
//!
//! A line-oriented loop: read a line, hand it to the orchestrator, append
//! what comes back. The thread on screen is exactly the conversation store;
//! diagnostics appear as ordinary replies, so a failed send still reads as
//! a conversation.

use std::error::Error;
use std::io::Write as _;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::config::data::Settings;
use crate::core::conversation::Conversation;
use crate::core::orchestrator::Orchestrator;
use crate::utils::transcript::TranscriptLog;

const GREETING: &str = "Hello! How can I help you today?";
const USER_LABEL: &str = "You";

const HELP_TEXT: &str = "\
Commands:
  /help          Show this help
  /log <file>    Write a transcript of the conversation to <file>
  /log           Pause or resume the transcript
  /quit          Leave the chat";

enum LoopAction {
    Continue,
    Quit,
}

pub async fn run_chat(
    settings: Settings,
    orchestrator: Orchestrator,
    log_file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut transcript = TranscriptLog::new(log_file)?;
    let mut conversation = Conversation::new();
    let nickname = settings.profile.bot_nickname.clone();

    println!(
        "Chatting with {nickname} via the {} provider. Type /help for commands.",
        orchestrator.provider_name()
    );

    // The session opens with a greeting, same as the thread in the web build.
    conversation.push_assistant(GREETING);
    print_message(&nickname, GREETING);
    log_or_warn(&transcript, &nickname, GREETING);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break; // stdin closed
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            match handle_command(command, &mut transcript) {
                LoopAction::Continue => continue,
                LoopAction::Quit => break,
            }
        }

        // Snapshot semantics: the window is built from the thread as it
        // stood before this message, then the exchange is appended in order.
        let Some(outcome) = orchestrator.deliver(&conversation, input).await else {
            continue;
        };
        conversation.push_user(input);
        log_or_warn(&transcript, USER_LABEL, input);

        let reply = outcome.thread_text();
        conversation.push_assistant(reply.clone());
        print_message(&nickname, &reply);
        log_or_warn(&transcript, &nickname, &reply);
    }

    println!("Bye!");
    Ok(())
}

fn handle_command(command: &str, transcript: &mut TranscriptLog) -> LoopAction {
    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let argument = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    match name {
        "quit" | "exit" => return LoopAction::Quit,
        "help" => println!("{HELP_TEXT}"),
        "log" => {
            let result = match argument {
                Some(path) => transcript.enable(path.to_string()),
                None => transcript.toggle(),
            };
            match result {
                Ok(message) => println!("{message}"),
                Err(err) => println!("{err}"),
            }
        }
        other => println!("Unknown command: /{other} (try /help)"),
    }
    LoopAction::Continue
}

fn print_message(nickname: &str, content: &str) {
    println!();
    println!("{nickname} · {}", Local::now().format("%H:%M"));
    println!("{content}");
    println!();
}

fn prompt() {
    print!("{USER_LABEL} > ");
    let _ = std::io::stdout().flush();
}

fn log_or_warn(transcript: &TranscriptLog, speaker: &str, content: &str) {
    if let Err(err) = transcript.record(speaker, content) {
        eprintln!("Failed to write transcript: {err}");
    }
}

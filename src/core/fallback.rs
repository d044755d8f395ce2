//! Rule-based offline responder.
//!
//! When no live backend can answer, the client still replies with something
//! friendly. This is a keyword lookup, not a model: first match wins, and
//! anything unmatched draws from a small pool of generic acknowledgements.

use std::time::Duration;

use chrono::Local;

/// Artificial delay callers apply before presenting an offline reply, so it
/// reads as a response rather than an instantaneous echo.
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(500);

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "greetings", "yo"];

const GREETING_REPLY: &str =
    "Hello! Looks like we're offline right now, but I'm still here to chat. 📡";
const TIME_PREFIX: &str = "It's currently ";
const DATE_PREFIX: &str = "Today is ";
const WEATHER_REPLY: &str =
    "I can't see the sky without a connection, but let's assume it's sunny. ☀️";
const IDENTITY_REPLY: &str =
    "I'm your chat companion, running in offline mode until we reconnect.";
const QUESTION_REPLY: &str =
    "Good question! I can't look anything up right now, but I'm listening. 🤔";

const GENERIC_REPLIES: &[&str] = &[
    "I'm offline at the moment, so you're getting the small-brain version of me. Still listening!",
    "Message received! (offline mode 📶)",
    "The cloud is out of reach right now, but your words made it here just fine.",
    "No connection at the moment. Consider me a very attentive echo.",
    "I'm running offline right now. Once we reconnect I'll have better answers.",
];

/// Produce an offline reply for one outbound message.
///
/// Matching is case-insensitive. Greetings match on whole words only, so
/// "historic" does not greet back; the other rules match on substrings, in a
/// fixed order that puts specific topics ahead of the generic question rule.
pub fn offline_reply(text: &str) -> String {
    let lower = text.to_lowercase();

    if contains_word(&lower, GREETING_WORDS) {
        return GREETING_REPLY.to_string();
    }
    if lower.contains("time") {
        return format!("{TIME_PREFIX}{}. ⌚", Local::now().format("%H:%M"));
    }
    if lower.contains("date") {
        return format!("{DATE_PREFIX}{}. 📅", Local::now().format("%Y-%m-%d"));
    }
    if lower.contains("weather") {
        return WEATHER_REPLY.to_string();
    }
    if lower.contains("who are you") || lower.contains("your name") {
        return IDENTITY_REPLY.to_string();
    }
    if lower.trim_end().ends_with('?') {
        return QUESTION_REPLY.to_string();
    }

    GENERIC_REPLIES[pick(GENERIC_REPLIES.len())].to_string()
}

fn contains_word(haystack: &str, words: &[&str]) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

fn pick(len: usize) -> usize {
    let mut buf = [0u8; 4];
    match getrandom::fill(&mut buf) {
        Ok(()) => u32::from_ne_bytes(buf) as usize % len,
        Err(_) => 0,
    }
}

//! The append-only conversation store.
//!
//! A [`Conversation`] is the single source of truth for the visible thread.
//! Entries are never edited or removed once appended; ids and timestamps are
//! assigned here so callers cannot forge either.

use crate::core::message::{Message, MessageId, Role};

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user-authored message and return the stored entry.
    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::User, content.into())
    }

    /// Append an assistant-authored message and return the stored entry.
    ///
    /// Inline diagnostics are appended through this path too; the store does
    /// not distinguish them from model replies.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::Assistant, content.into())
    }

    fn push(&mut self, role: Role, content: String) -> &Message {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        self.messages.push(Message::new(id, role, content));
        // Just pushed, so the vector is non-empty.
        &self.messages[self.messages.len() - 1]
    }

    /// All messages in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The trailing `k` messages in append order, or everything when the
    /// thread is shorter than `k`.
    pub fn recent(&self, k: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(k);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn appends_preserve_order_and_roles() {
        let mut conversation = Conversation::new();
        conversation.push_user("hello");
        conversation.push_assistant("hi there");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert!(messages[0].is_user());
        assert_eq!(messages[1].content, "hi there");
        assert!(messages[1].is_assistant());
    }

    #[test]
    fn ids_are_unique_and_strictly_increasing() {
        let conversation = seeded(10);
        let ids: Vec<_> = conversation.messages().iter().map(|m| m.id).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn recent_takes_the_tail() {
        let conversation = seeded(8);
        let window = conversation.recent(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "m5");
        assert_eq!(window[2].content, "m7");
    }

    #[test]
    fn recent_with_a_large_k_returns_everything() {
        let conversation = seeded(4);
        assert_eq!(conversation.recent(100).len(), 4);
    }

    #[test]
    fn recent_with_zero_is_empty() {
        let conversation = seeded(4);
        assert!(conversation.recent(0).is_empty());
    }

    #[test]
    fn timestamps_never_run_backwards() {
        let conversation = seeded(5);
        let stamps: Vec<_> = conversation
            .messages()
            .iter()
            .map(|m| m.created_at)
            .collect();
        for pair in stamps.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}

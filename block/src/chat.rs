//! Chat transcript beside the document block.
//!
//! The chat itself is a collaborator; the block only needs an ordered list
//! of messages with stable ids and the "last message is loading" rule.

use shared_types::{ChatMessage, Sender};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTranscript {
    chat_id: String,
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            messages: Vec::new(),
        }
    }

    /// Start from messages loaded elsewhere, assigning ids where missing.
    pub fn with_messages(chat_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        let mut transcript = Self::new(chat_id);
        for message in messages {
            transcript.append(message);
        }
        transcript
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message and return its id.
    pub fn append(&mut self, mut message: ChatMessage) -> String {
        if message.id.trim().is_empty() {
            message.id = ulid::Ulid::new().to_string();
        }
        let id = message.id.clone();
        tracing::debug!(chat_id = %self.chat_id, message_id = %id, sender = ?message.sender, "Chat message appended");
        self.messages.push(message);
        id
    }

    /// Mark an optimistic message as confirmed by the backend.
    pub fn confirm(&mut self, message_id: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.pending = false;
                true
            }
            None => false,
        }
    }

    /// Latest assistant reply, if any.
    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Assistant)
    }

    /// Only the newest message shows the loading indicator.
    pub fn is_loading(&self, index: usize, loading: bool) -> bool {
        loading && index + 1 == self.messages.len()
    }
}

//! The core models for managing a stateful chat with a character.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: &str, sequence: u64) -> Self {
        Self {
            role,
            content: content.to_string(),
            sequence,
            created_at: Utc::now(),
        }
    }
}

/// The next user turn as collected by a UI surface.
#[derive(Debug, Clone)]
pub enum UserInput {
    Text(String),
    Audio(Vec<u8>),
}

/// Append-only history of a single conversation. The system message
/// is never stored here, it's rendered fresh for every model call.
#[derive(Default, Debug)]
pub struct Transcript {
    messages: Vec<Message>,
    next_sequence: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, role: Role, content: &str) -> &Message {
        let msg = Message::new(role, content, self.next_sequence);
        self.next_sequence += 1;
        self.messages.push(msg);
        // Just pushed so there is always a last element
        &self.messages[self.messages.len() - 1]
    }

    /// Starts a brand new conversation.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.next_sequence = 0;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

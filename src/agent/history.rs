//! Message history - ordered conversation log for one agent run

use super::message::Message;

/// Message history trait - interface for conversation storage
pub trait MessageHistory: Send + Sync {
    /// Append a message to the end of the log
    fn add_message(&mut self, message: Message);

    /// Owned copy of the full ordered log
    fn messages(&self) -> Vec<Message>;

    /// Drop every message
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory history, unbounded for the lifetime of a run
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageHistory {
    messages: Vec<Message>,
}

impl InMemoryMessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the log without copying it.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

impl MessageHistory for InMemoryMessageHistory {
    fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn clear(&mut self) {
        self.messages.clear();
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}

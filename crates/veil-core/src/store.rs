//! Per-session message log.

use crate::message::Message;

/// Append-only ordered log of decoded messages.
///
/// Fed by the session driver in transport arrival order; consumed by
/// the presentation layer. Entries are never mutated after append, and
/// the whole log is cleared when the active group changes: the store
/// holds no durable history, and a backlog from a previous group must
/// not appear under the new group's context.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the tail.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages belonging to `group_id`, preserving arrival order.
    pub fn filter_by_group(&self, group_id: &str) -> Vec<Message> {
        self.messages.iter().filter(|m| m.group_id == group_id).cloned().collect()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

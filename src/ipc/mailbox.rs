/*!
 * Mailbox
 * Per-process first-in-first-out message queue
 */

use super::types::Message;
use std::collections::VecDeque;

/// FIFO mailbox owned by a process and appended to by any sender
///
/// Unbounded: `send` never blocks and never fails for lack of room.
/// Messages delivered to a dead process stay here unread.
#[derive(Debug, Default)]
pub struct Mailbox {
    messages: VecDeque<Message>,
    delivered: u64,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    pub fn pop(&mut self) -> Option<Message> {
        let message = self.messages.pop_front()?;
        self.delivered += 1;
        Some(message)
    }

    pub fn peek(&self) -> Option<&Message> {
        self.messages.front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages dequeued over the mailbox's lifetime
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

//! Conversation backlog: the bounded window of recent messages that the
//! oracle sees as context.

use std::collections::VecDeque;
use std::sync::Arc;

use maestro_core::transport::RoomMessage;
use tokio::sync::RwLock;

pub const DEFAULT_MAX_BACKLOG: usize = 10;

pub type SharedBacklog = Arc<RwLock<ConversationBacklog>>;

/// Chronological FIFO of room messages. Never holds more than `capacity`.
#[derive(Debug)]
pub struct ConversationBacklog {
    messages: VecDeque<RoomMessage>,
    capacity: usize,
}

impl Default for ConversationBacklog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BACKLOG)
    }
}

impl ConversationBacklog {
    /// Create a backlog holding at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn shared(self) -> SharedBacklog {
        Arc::new(RwLock::new(self))
    }

    /// Add to the tail, evicting the oldest entries beyond capacity.
    pub fn append(&mut self, message: RoomMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Snapshot, oldest first.
    pub fn as_ordered_sequence(&self) -> Vec<RoomMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

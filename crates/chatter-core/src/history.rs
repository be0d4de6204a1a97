//! Append-only message history.
//!
//! [`HistoryLog`] is a plain ordered store. It performs no locking of its
//! own: the [`Broadcaster`](crate::Broadcaster) keeps it inside the same
//! critical section as the subscriber registry, which is what makes a
//! snapshot and a subscriber registration atomic with respect to
//! publication.

use chatter_types::Message;

/// Ordered, append-only record of published messages.
///
/// Insertion order is publication order. Entries are never removed or
/// reordered, so the log grows for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<Message>,
}

impl HistoryLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a message at the end of the log.
    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    /// Return an owned, ordered copy of every message appended so far.
    ///
    /// The copy is independent of the log: later appends are not visible
    /// through it.
    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.clone()
    }

    /// Number of messages in the log.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been appended yet.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the log in publication order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }
}

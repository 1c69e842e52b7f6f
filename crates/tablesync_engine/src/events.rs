//! Table event feed.
//!
//! Every completed or failed engine operation is published to the
//! subscribers of the table's [`TableFeed`]. A presentation layer watching
//! the feed re-renders on completions and shows a notification on
//! failures.

use parking_lot::RwLock;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

/// Remote operations issued by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Full list fetch.
    Load,
    /// Create from the add buffer.
    Create,
    /// Update from the edit session.
    Update,
    /// Delete of one record.
    Delete,
}

impl Operation {
    /// Lower-case operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event published after an operation finished.
///
/// Keys are rendered as `/`-joined segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// The cache was replaced by a fresh list.
    Loaded {
        /// Number of cached records after deduplication.
        count: usize,
    },
    /// A record was created and appended.
    Created {
        /// Key of the created record.
        key: String,
    },
    /// A record was updated in place.
    Updated {
        /// Key the update was addressed to.
        original_key: String,
        /// Key of the record returned by the server.
        key: String,
    },
    /// A record was deleted.
    Deleted {
        /// Key of the deleted record.
        key: String,
    },
    /// An operation failed; local state kept its last good value.
    Failed {
        /// The failing operation.
        operation: Operation,
        /// Error message.
        message: String,
    },
}

impl TableEvent {
    /// Returns true for [`TableEvent::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, TableEvent::Failed { .. })
    }
}

/// Distributes [`TableEvent`]s to subscribers.
///
/// Disconnected receivers are dropped on the next emit.
pub struct TableFeed {
    subscribers: RwLock<Vec<Sender<TableEvent>>>,
}

impl TableFeed {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> Receiver<TableEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Sends an event to every live subscriber.
    pub fn emit(&self, event: TableEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for TableFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TableFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

//! Conversation store: ordered, append-only message history.

use std::sync::Arc;

use huddle_api::{HistoryEntry, Role};
use serde::{Serialize, Serializer};
use tokio::sync::broadcast;

use crate::{
    error::{Error, Result},
    events::ChatEvent,
    message::{Message, MessageId, NewMessage},
};

/// Capacity of the event channel created by [`ConversationStore::default`]
pub(crate) const EVENT_CAPACITY: usize = 256;

/// The caller's answer to "clear the conversation?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearDecision {
    Confirmed,
    Declined,
}

impl From<bool> for ClearDecision {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            ClearDecision::Confirmed
        } else {
            ClearDecision::Declined
        }
    }
}

/// Ordered message history for one mounted chat.
///
/// Messages are only ever appended; the only other mutation is a confirmed
/// [`clear`](Self::clear). Snapshots share the underlying vector and are
/// detached on the next write.
pub struct ConversationStore {
    messages: Arc<Vec<Message>>,
    next_id: u64,
    events: broadcast::Sender<ChatEvent>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self::new(events)
    }
}

impl ConversationStore {
    /// Create an empty store publishing to `events`
    pub fn new(events: broadcast::Sender<ChatEvent>) -> Self {
        Self {
            messages: Arc::new(Vec::new()),
            next_id: 1,
            events,
        }
    }

    /// Subscribe to store events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Append a message at the end.
    ///
    /// User messages with blank content are rejected with
    /// [`Error::InvalidState`]. Assistant messages are not checked.
    pub fn append(&mut self, message: NewMessage) -> Result<MessageId> {
        if message.role == Role::User && message.content.trim().is_empty() {
            return Err(Error::InvalidState(
                "user message content must not be empty".to_string(),
            ));
        }
        Ok(self.push(message))
    }

    /// Append without validation. Callers check the message first.
    pub(crate) fn push(&mut self, message: NewMessage) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;

        let message = Message::from_new(id, message);
        let (role, kind) = (message.role(), message.kind());
        Arc::make_mut(&mut self.messages).push(message);

        let _ = self.events.send(ChatEvent::MessageAppended { id, role, kind });
        id
    }

    /// Empty the conversation if the caller confirmed it.
    ///
    /// Returns whether anything was cleared. Ids keep increasing after a clear.
    pub fn clear(&mut self, decision: ClearDecision) -> bool {
        if decision == ClearDecision::Declined {
            return false;
        }
        let removed = self.messages.len();
        self.messages = Arc::new(Vec::new());
        let _ = self.events.send(ChatEvent::Cleared { removed });
        true
    }

    /// Immutable view of the history as `{role, content}` pairs
    pub fn snapshot_history(&self) -> HistorySnapshot {
        HistorySnapshot {
            messages: Arc::clone(&self.messages),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One history entry borrowed from a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryTurn<'a> {
    pub role: Role,
    pub content: &'a str,
}

impl HistoryTurn<'_> {
    /// Owned wire form
    pub fn to_entry(&self) -> HistoryEntry {
        HistoryEntry::new(self.role, self.content)
    }
}

/// Read-only history at a point in time.
///
/// Iteration is lazy and may be repeated; ids and timestamps are not exposed.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    messages: Arc<Vec<Message>>,
}

impl HistorySnapshot {
    pub fn iter(&self) -> HistoryIter<'_> {
        HistoryIter {
            inner: self.messages.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Owned entries for a [`huddle_api::ChatRequest`]
    pub fn to_entries(&self) -> Vec<HistoryEntry> {
        self.iter().map(|turn| turn.to_entry()).collect()
    }
}

impl<'a> IntoIterator for &'a HistorySnapshot {
    type Item = HistoryTurn<'a>;
    type IntoIter = HistoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for HistorySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Iterator over a [`HistorySnapshot`]
#[derive(Debug, Clone)]
pub struct HistoryIter<'a> {
    inner: std::slice::Iter<'a, Message>,
}

impl<'a> Iterator for HistoryIter<'a> {
    type Item = HistoryTurn<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|m| HistoryTurn {
            role: m.role(),
            content: m.content(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for HistoryIter<'_> {}

//! Conversation message records

use chrono::{DateTime, Utc};
use huddle_api::Role;
use serde::{Deserialize, Serialize};

/// Reply shown in place of a failed exchange. Never carries error detail.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

/// Locally generated message identifier, increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// How a message came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Typed by the user or returned by the backend
    Reply,
    /// Synthesized after a failed exchange
    Fallback,
}

/// A message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    kind: MessageKind,
}

impl Message {
    pub(crate) fn from_new(id: MessageId, new: NewMessage) -> Self {
        Self {
            id,
            role: new.role,
            content: new.content,
            timestamp: Utc::now(),
            kind: new.kind,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Message text (markdown for assistant replies)
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Whether this is the synthetic reply for a failed exchange
    pub fn is_fallback(&self) -> bool {
        self.kind == MessageKind::Fallback
    }
}

/// A message that has not been appended yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub(crate) role: Role,
    pub(crate) content: String,
    pub(crate) kind: MessageKind,
}

impl NewMessage {
    /// User-authored text. Must not be blank.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            kind: MessageKind::Reply,
        }
    }

    /// Assistant reply text from the backend
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: MessageKind::Reply,
        }
    }

    /// Fixed assistant reply standing in for a failed exchange
    pub fn fallback() -> Self {
        Self {
            role: Role::Assistant,
            content: FALLBACK_REPLY.to_string(),
            kind: MessageKind::Fallback,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

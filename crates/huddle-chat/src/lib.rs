//! huddle-chat: Conversation engine for the meeting assistant
//!
//! This crate holds the in-memory conversation, runs one request/response
//! exchange per user turn against the backend, and publishes every change
//! as a [`ChatEvent`] for views to follow.

pub mod collab;
pub mod error;
pub mod events;
pub mod message;
pub mod session;
pub mod store;

pub use collab::{
    Backend, CredentialSource, HttpBackend, LogNotifier, NoCredentials, Notifier, StaticToken,
};
pub use error::{Error, Result, SubmitError};
pub use events::{ChatEvent, TurnOutcome};
pub use message::{FALLBACK_REPLY, Message, MessageId, MessageKind, NewMessage};
pub use session::{
    ChatSession, Completion, Exchange, FAILURE_NOTICE, Resolution, SessionConfig, SessionId,
};
pub use store::{ClearDecision, ConversationStore, HistorySnapshot, HistoryTurn};

pub use huddle_api::Role;

//! Chat session: drives one request/response exchange per user turn.
//!
//! A turn goes Idle -> Submitting -> Awaiting -> Resolved -> Idle:
//!
//! - [`ChatSession::submit`] validates the input, appends the user message,
//!   marks the session pending and hands back an [`Exchange`].
//! - [`Exchange::run`] performs the backend call without borrowing the
//!   session, so the caller's event loop keeps running meanwhile.
//! - [`ChatSession::resolve`] folds the [`Completion`] back into the store
//!   and returns the session to idle.

use std::sync::Arc;

use huddle_api::{ChatRequest, ChatResponse};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    collab::{Backend, CredentialSource, LogNotifier, NoCredentials, Notifier},
    error::SubmitError,
    events::{ChatEvent, TurnOutcome},
    message::{Message, MessageId, NewMessage},
    store::{ClearDecision, ConversationStore, EVENT_CAPACITY, HistorySnapshot},
};

/// Transient notice shown when an exchange fails
pub const FAILURE_NOTICE: &str = "Failed to send message";

/// Identity of one mounted chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Session configuration
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Meeting template sent with every request
    pub template_id: Option<String>,
}

/// The conversation of one mounted chat widget
pub struct ChatSession {
    id: SessionId,
    config: SessionConfig,
    store: ConversationStore,
    /// Turn number of the exchange in flight
    in_flight: Option<u64>,
    turns: u64,
    backend: Arc<dyn Backend>,
    credentials: Arc<dyn CredentialSource>,
    notifier: Arc<dyn Notifier>,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatSession {
    /// Create a session talking to `backend`, unauthenticated, notifying via logs
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: SessionId::new(),
            config: SessionConfig::default(),
            store: ConversationStore::new(event_tx.clone()),
            in_flight: None,
            turns: 0,
            backend,
            credentials: Arc::new(NoCredentials),
            notifier: Arc::new(LogNotifier),
            event_tx,
        }
    }

    /// Set the identity collaborator
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the notification collaborator
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set the session configuration
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Subscribe to conversation events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// Whether an exchange is awaiting its response
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn snapshot_history(&self) -> HistorySnapshot {
        self.store.snapshot_history()
    }

    /// Clear the conversation if confirmed. An exchange in flight is not
    /// cancelled; its reply lands in the emptied conversation.
    pub fn clear(&mut self, decision: ClearDecision) -> bool {
        let cleared = self.store.clear(decision);
        if cleared {
            tracing::debug!(session = %self.id, pending = self.is_pending(), "conversation cleared");
        }
        cleared
    }

    /// Start a turn.
    ///
    /// On success the user message is already in the store and the session is
    /// pending; the caller clears its draft and runs the returned exchange.
    pub fn submit(&mut self, input: &str) -> Result<Exchange, SubmitError> {
        if self.in_flight.is_some() {
            tracing::debug!(session = %self.id, "submission ignored: exchange in flight");
            return Err(SubmitError::AlreadyInFlight);
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        // History goes out without the new turn; the turn travels as `message`.
        let history = self.store.snapshot_history();
        self.store.push(NewMessage::user(text));

        self.turns += 1;
        let turn = self.turns;
        self.in_flight = Some(turn);
        let _ = self.event_tx.send(ChatEvent::TurnStarted { turn });

        tracing::debug!(session = %self.id, turn, history = history.len(), "turn started");

        let request = ChatRequest::new(text, history.to_entries())
            .with_template(self.config.template_id.clone());

        Ok(Exchange {
            session: self.id,
            turn,
            request,
            backend: Arc::clone(&self.backend),
            credentials: Arc::clone(&self.credentials),
        })
    }

    /// Apply a finished exchange.
    ///
    /// Completions from another session or for a turn that is not in flight
    /// are discarded untouched.
    pub fn resolve(&mut self, completion: Completion) -> Resolution {
        if completion.session != self.id || self.in_flight != Some(completion.turn) {
            tracing::debug!(
                session = %self.id,
                from_session = %completion.session,
                turn = completion.turn,
                "discarding stale completion"
            );
            return Resolution::Stale;
        }

        let turn = completion.turn;
        let (resolution, outcome) = match completion.result {
            Ok(response) => {
                let ChatResponse {
                    response,
                    model_used,
                    processing_time_ms,
                } = response;
                let id = self.store.push(NewMessage::assistant(response));
                tracing::debug!(session = %self.id, turn, model = %model_used, processing_time_ms, "turn replied");
                (
                    Resolution::Replied(id),
                    TurnOutcome::Replied {
                        model_used,
                        processing_time_ms,
                    },
                )
            }
            Err(error) => {
                tracing::warn!(
                    session = %self.id,
                    turn,
                    class = error.class(),
                    transient = error.is_transient(),
                    error = %error,
                    "chat exchange failed"
                );
                if let huddle_api::Error::Status { body, .. } = &error {
                    tracing::debug!(session = %self.id, turn, body = %body, "backend error body");
                }
                self.notifier.failure(FAILURE_NOTICE);
                let id = self.store.push(NewMessage::fallback());
                (Resolution::Failed(id), TurnOutcome::Failed)
            }
        };

        self.in_flight = None;
        let _ = self.event_tx.send(ChatEvent::TurnCompleted { turn, outcome });
        resolution
    }

    /// Submit, run and resolve one turn
    pub async fn send(&mut self, input: &str) -> Result<Resolution, SubmitError> {
        let exchange = self.submit(input)?;
        let completion = exchange.run().await;
        Ok(self.resolve(completion))
    }
}

/// An accepted turn waiting to be sent
pub struct Exchange {
    session: SessionId,
    turn: u64,
    request: ChatRequest,
    backend: Arc<dyn Backend>,
    credentials: Arc<dyn CredentialSource>,
}

impl Exchange {
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Call the backend. The credential is read now, not at submit time.
    pub async fn run(self) -> Completion {
        let bearer = self.credentials.bearer_token();
        let result = self.backend.exchange(&self.request, bearer.as_deref()).await;
        Completion {
            session: self.session,
            turn: self.turn,
            result,
        }
    }
}

/// Result of a finished exchange, to be handed to [`ChatSession::resolve`]
#[derive(Debug)]
pub struct Completion {
    session: SessionId,
    turn: u64,
    result: huddle_api::Result<ChatResponse>,
}

impl Completion {
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// What [`ChatSession::resolve`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Assistant reply appended
    Replied(MessageId),
    /// Fallback reply appended and failure notified
    Failed(MessageId),
    /// Completion did not belong to the in-flight turn; nothing changed
    Stale,
}

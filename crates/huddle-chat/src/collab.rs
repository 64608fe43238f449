//! Collaborators the session depends on: backend, identity, notifications.

use async_trait::async_trait;
use huddle_api::{ChatClient, ChatRequest, ChatResponse};

/// The remote AI endpoint, one call per turn
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one exchange. `bearer` is attached when present.
    async fn exchange(
        &self,
        request: &ChatRequest,
        bearer: Option<&str>,
    ) -> huddle_api::Result<ChatResponse>;
}

/// [`Backend`] over HTTP
pub struct HttpBackend {
    client: ChatClient,
}

impl HttpBackend {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn exchange(
        &self,
        request: &ChatRequest,
        bearer: Option<&str>,
    ) -> huddle_api::Result<ChatResponse> {
        self.client.chat(request, bearer).await
    }
}

/// Source of the current session's bearer credential.
///
/// Read once per turn at call time, so a refreshed token applies to the
/// next submission.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

impl<F> CredentialSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}

/// No credential; requests go out unauthenticated
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl CredentialSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Shows transient failure messages to the user. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn failure(&self, message: &str);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn failure(&self, message: &str) {
        tracing::warn!(notice = message, "chat failure notice");
    }
}

//! HTTP client for the chat endpoint

use std::time::Duration;

use crate::{
    error::{Error, Result},
    types::{ChatRequest, ChatResponse},
};

/// Default chat endpoint path
pub const DEFAULT_CHAT_PATH: &str = "/v2/ai/chat";

/// Client for the backend chat endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    path: String,
}

impl ChatClient {
    /// Create a client for the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(client, base_url))
    }

    /// Create a client from a preconfigured reqwest client
    pub fn with_http_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            path: DEFAULT_CHAT_PATH.to_string(),
        }
    }

    /// Override the endpoint path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    /// Backend base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    /// Run one chat exchange.
    ///
    /// `bearer` is attached as an `Authorization` header when present. Without
    /// it the request goes out unauthenticated and the backend decides.
    pub async fn chat(&self, request: &ChatRequest, bearer: Option<&str>) -> Result<ChatResponse> {
        let url = self.endpoint();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!("not an http(s) URL: {}", url)));
        }

        let mut builder = self.client.post(&url).json(request);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(
            url = %url,
            history = request.history.len(),
            authenticated = bearer.is_some(),
            "sending chat request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::status(status.as_u16(), body));
        }

        serde_json::from_str::<ChatResponse>(&body)
            .map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

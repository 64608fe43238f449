//! Wire types for the chat exchange

use serde::{Deserialize, Serialize};

/// Who authored a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name of this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prior turn as the backend sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body for `POST /v2/ai/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user turn
    pub message: String,
    /// Conversation so far, oldest first (excludes `message`)
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Meeting template the backend should prepend to the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<HistoryEntry>) -> Self {
        Self {
            message: message.into(),
            history,
            template_id: None,
        }
    }

    /// Attach a template id
    pub fn with_template(mut self, template_id: Option<String>) -> Self {
        self.template_id = template_id;
        self
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Natural-language reply
    pub response: String,
    /// Model that produced the reply
    #[serde(default)]
    pub model_used: String,
    /// Backend-side processing latency
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl ChatResponse {
    /// Create a response with only the reply text
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            model_used: String::new(),
            processing_time_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let req = ChatRequest::new(
            "Extract action items",
            vec![
                HistoryEntry::new(Role::User, "Hi"),
                HistoryEntry::new(Role::Assistant, "Hello!"),
            ],
        );
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "Extract action items",
                "history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello!"}
                ]
            })
        );
    }

    #[test]
    fn test_request_template_id_serialized_when_set() {
        let req = ChatRequest::new("Hi", vec![]).with_template(Some("tpl-1".into()));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["template_id"], "tpl-1");
        assert_eq!(value["history"], json!([]));
    }

    #[test]
    fn test_response_optional_fields_default() {
        let resp: ChatResponse = serde_json::from_value(json!({"response": "ok"})).unwrap();
        assert_eq!(resp, ChatResponse::text("ok"));
    }

    #[test]
    fn test_response_accepts_extra_fields() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "response": "Here is a summary...",
            "model_used": "gpt-4o",
            "processing_time_ms": 812,
            "request_id": "abc"
        }))
        .unwrap();
        assert_eq!(resp.model_used, "gpt-4o");
        assert_eq!(resp.processing_time_ms, 812);
    }

    #[test]
    fn test_response_requires_response_field() {
        let result: Result<ChatResponse, _> =
            serde_json::from_value(json!({"model_used": "gpt-4o"}));
        assert!(result.is_err());
    }
}

//! Conversation event types

use huddle_api::Role;
use serde::{Deserialize, Serialize};

use crate::message::{MessageId, MessageKind};

/// Events emitted when the conversation changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A message was added to the end of the conversation
    MessageAppended {
        id: MessageId,
        role: Role,
        kind: MessageKind,
    },

    /// The conversation was emptied after confirmation
    Cleared { removed: usize },

    /// An exchange was accepted and is awaiting the backend
    TurnStarted { turn: u64 },

    /// The exchange for `turn` resolved; the session is idle again
    TurnCompleted { turn: u64, outcome: TurnOutcome },
}

/// How a turn resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Backend replied
    Replied {
        model_used: String,
        processing_time_ms: u64,
    },
    /// Exchange failed; a fallback reply was appended
    Failed,
}

impl ChatEvent {
    /// Check if this event ends a turn
    pub fn is_turn_end(&self) -> bool {
        matches!(self, ChatEvent::TurnCompleted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_tagging() {
        let event = ChatEvent::TurnCompleted {
            turn: 3,
            outcome: TurnOutcome::Replied {
                model_used: "gpt-4o".into(),
                processing_time_ms: 90,
            },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "turn_completed",
                "turn": 3,
                "outcome": {"status": "replied", "model_used": "gpt-4o", "processing_time_ms": 90}
            })
        );
        assert!(event.is_turn_end());
        assert!(!ChatEvent::TurnStarted { turn: 1 }.is_turn_end());
    }
}

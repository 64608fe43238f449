//! Shared utilities

use huddle_chat::TurnOutcome;

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// One-line summary of how a turn ended, for status lines
pub fn outcome_summary(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Replied {
            model_used,
            processing_time_ms,
        } if model_used.is_empty() => format!("{processing_time_ms} ms"),
        TurnOutcome::Replied {
            model_used,
            processing_time_ms,
        } => format!("{} │ {processing_time_ms} ms", truncate_chars(model_used, 32)),
        TurnOutcome::Failed => "failed".to_string(),
    }
}

//! Line mode and one-shot mode over plain stdin/stdout

use std::io::{BufRead, Write};

use huddle_chat::{ChatSession, ClearDecision, Resolution};

use crate::commands::{CommandResult, execute_command};

pub const CLEAR_PROMPT: &str = "Clear chat history? (y/n) ";

/// Send one message and print the reply. Fails if the exchange failed.
pub async fn run_command<W: Write>(
    session: &mut ChatSession,
    command: &str,
    out: &mut W,
) -> anyhow::Result<()> {
    let resolution = session.send(command).await?;
    print_reply(session, resolution, out)?;
    match resolution {
        Resolution::Failed(_) => anyhow::bail!(huddle_chat::FAILURE_NOTICE),
        _ => Ok(()),
    }
}

/// Interactive loop: one line per message until EOF or `/quit`
pub async fn run_lines<R: BufRead, W: Write>(
    session: &mut ChatSession,
    mut input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = read_line(&mut input)? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(result) = execute_command(line) {
            match result {
                CommandResult::Clear => {
                    write!(out, "{CLEAR_PROMPT}")?;
                    out.flush()?;
                    let answer = read_line(&mut input)?.unwrap_or_default();
                    let decision = ClearDecision::from(is_yes(&answer));
                    if session.clear(decision) {
                        writeln!(out, "Cleared conversation.")?;
                    } else {
                        writeln!(out, "Kept conversation.")?;
                    }
                }
                CommandResult::Exit => break,
                CommandResult::Message(msg) => writeln!(out, "{msg}")?,
                CommandResult::Unknown(cmd) => {
                    writeln!(out, "Unknown command: /{cmd}")?;
                    writeln!(out, "Type /help for available commands.")?;
                }
            }
            continue;
        }

        match session.send(line).await {
            Ok(resolution) => print_reply(session, resolution, out)?,
            Err(e) => writeln!(out, "{e}")?,
        }
    }

    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_reply<W: Write>(
    session: &ChatSession,
    resolution: Resolution,
    out: &mut W,
) -> std::io::Result<()> {
    let id = match resolution {
        Resolution::Replied(id) | Resolution::Failed(id) => id,
        Resolution::Stale => return Ok(()),
    };
    if let Some(message) = session.messages().iter().find(|m| m.id() == id) {
        writeln!(out, "{}", message.content())?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_api::ChatClient;
    use huddle_chat::{FALLBACK_REPLY, HttpBackend, NoCredentials};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(base_url: &str) -> ChatSession {
        let backend = Arc::new(HttpBackend::new(ChatClient::new(base_url)));
        ChatSession::new(backend)
            .with_credentials(Arc::new(NoCredentials))
            .with_notifier(Arc::new(crate::notify::StderrNotifier))
    }

    async fn replying_server(reply: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ai/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": reply,
                "model_used": "gpt-4o",
                "processing_time_ms": 12,
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[tokio::test]
    async fn test_line_mode_conversation_and_clear() {
        let server = replying_server("Here are the action items.").await;
        let mut session = session_for(&server.uri());
        let input = "Extract action items\n/clear\ny\n/quit\nnever sent\n";
        let mut out = Vec::new();

        run_lines(&mut session, input.as_bytes(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Here are the action items."));
        assert!(out.contains(CLEAR_PROMPT));
        assert!(out.contains("Cleared conversation."));
        assert!(session.messages().is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_declined_clear_keeps_history() {
        let server = replying_server("ok").await;
        let mut session = session_for(&server.uri());
        let mut out = Vec::new();

        run_lines(&mut session, "hello\n/clear\nn\n".as_bytes(), &mut out)
            .await
            .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Kept conversation."));
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_one_shot_failure_prints_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let mut session = session_for(&server.uri());
        let mut out = Vec::new();

        let result = run_command(&mut session, "Draft a follow-up email", &mut out).await;

        assert!(result.is_err());
        assert!(String::from_utf8(out).unwrap().contains(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn test_one_shot_success() {
        let server = replying_server("Dear team,").await;
        let mut session = session_for(&server.uri());
        let mut out = Vec::new();

        run_command(&mut session, "Draft a follow-up email", &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Dear team,\n\n");
    }
}

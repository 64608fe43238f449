//! Slash commands for interactive modes

/// Result of parsing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Ask to clear the conversation
    Clear,
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse a slash command. Returns `None` for ordinary chat input.
pub fn execute_command(input: &str) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let command = rest
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),
        "clear" | "c" => CommandResult::Clear,
        "quit" | "exit" | "q" => CommandResult::Exit,
        _ => CommandResult::Unknown(command),
    })
}

pub fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /clear, /c           Clear conversation history (asks first)
  /quit, /exit, /q     Exit huddle

Keys (TUI):
  Enter                Send message
  Shift+Enter, Ctrl+J  New line
  Tab                  Cycle suggestions / focus input
  Ctrl+L               Clear conversation
  PgUp/PgDn            Scroll history
  Ctrl+C, Ctrl+Q       Quit"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_is_not_a_command() {
        assert_eq!(execute_command("Extract action items"), None);
    }

    #[test]
    fn test_commands() {
        assert_eq!(execute_command("/clear"), Some(CommandResult::Clear));
        assert_eq!(execute_command("  /Q "), Some(CommandResult::Exit));
        assert!(matches!(
            execute_command("/help"),
            Some(CommandResult::Message(_))
        ));
        assert_eq!(
            execute_command("/summon"),
            Some(CommandResult::Unknown("summon".into()))
        );
    }
}

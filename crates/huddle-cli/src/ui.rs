//! TUI implementation for huddle

use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, MouseEventKind};
use futures::StreamExt;
use huddle_chat::{
    ChatEvent, ChatSession, ClearDecision, Completion, Exchange, Resolution, SubmitError,
};
use huddle_tui::{
    App, Theme, ViewSync,
    input::{Action, event_to_action},
    widgets::{InputBox, MessageList, Spinner, Toast, calculate_message_height},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use tokio::sync::{broadcast, mpsc};

use crate::commands::{CommandResult, execute_command, help_message};
use crate::splash;
use crate::utils::outcome_summary;

/// Starter prompts offered on an empty conversation
pub const SUGGESTIONS: [&str; 4] = [
    "Help me summarize the meeting",
    "Draft a follow-up email",
    "Extract action items",
    "Translate to English",
];

const CLEAR_CONFIRM: &str = "Clear chat history? (y/n)";
const SCROLL_STEP: usize = 3;

/// What the event loop should do after an input action
pub enum Step {
    Continue,
    Quit,
    /// Run this exchange off the UI loop
    Dispatch(Exchange),
}

/// TUI application state
pub struct TuiState {
    session: ChatSession,
    events: broadcast::Receiver<ChatEvent>,
    toasts: mpsc::UnboundedReceiver<String>,
    input: InputBox,
    view: ViewSync,
    theme: Theme,
    title: String,
    /// Outcome of the last turn
    status: String,
    /// Set while an exchange is in flight; drives the spinner
    pending_since: Option<Instant>,
    toast: Option<Toast>,
    confirm_clear: bool,
    /// Help or other text shown over the conversation until a key is pressed
    overlay: Option<String>,
    suggestion: Option<usize>,
    show_intro: bool,
}

impl TuiState {
    pub fn new(
        session: ChatSession,
        toasts: mpsc::UnboundedReceiver<String>,
        title: impl Into<String>,
    ) -> Self {
        let mut input = InputBox::new().with_placeholder("Ask about your meeting...");
        input.set_focused(true);

        Self {
            events: session.subscribe(),
            session,
            toasts,
            input,
            view: ViewSync::new(),
            theme: Theme::dark(),
            title: title.into(),
            status: "Ready".to_string(),
            pending_since: None,
            toast: None,
            confirm_clear: false,
            overlay: None,
            suggestion: None,
            show_intro: splash::claim_intro(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Apply everything the session published since the last call
    fn drain_events(&mut self, now: Instant) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.on_chat_event(&event, now),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "ui fell behind on chat events");
                }
                Err(_) => break,
            }
        }
        while let Ok(notice) = self.toasts.try_recv() {
            self.toast = Some(Toast::new(notice, now));
        }
        self.input.set_focused(self.view.is_input_focused());
    }

    fn on_chat_event(&mut self, event: &ChatEvent, now: Instant) {
        self.view.on_event(event, now);
        match event {
            ChatEvent::TurnStarted { .. } => {
                self.pending_since = Some(now);
                self.suggestion = None;
            }
            ChatEvent::TurnCompleted { outcome, .. } => {
                self.pending_since = None;
                self.status = outcome_summary(outcome);
            }
            ChatEvent::Cleared { .. } => {
                self.status = "Cleared".to_string();
            }
            ChatEvent::MessageAppended { .. } => {}
        }
    }

    /// Fold a finished exchange back into the session
    pub fn on_completion(&mut self, completion: Completion, now: Instant) {
        if self.session.resolve(completion) == Resolution::Stale {
            tracing::debug!("discarded stale completion");
        }
        self.drain_events(now);
    }

    /// Periodic housekeeping: delayed refocus and toast expiry
    pub fn tick(&mut self, now: Instant) {
        if self.view.tick(now) {
            self.input.set_focused(self.view.is_input_focused());
        }
        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
        }
    }

    /// Handle keyboard action
    pub fn handle_action(&mut self, action: Action, width: u16, now: Instant) -> Step {
        if self.overlay.take().is_some() {
            return Step::Continue;
        }

        if self.confirm_clear {
            let decision = match action {
                Action::Char('y' | 'Y') => Some(ClearDecision::Confirmed),
                Action::Char('n' | 'N') | Action::Escape => Some(ClearDecision::Declined),
                _ => None,
            };
            if let Some(decision) = decision {
                self.confirm_clear = false;
                self.session.clear(decision);
                self.drain_events(now);
            }
            return Step::Continue;
        }

        match action {
            Action::Interrupt | Action::Quit => Step::Quit,
            Action::Clear => {
                self.confirm_clear = true;
                Step::Continue
            }
            Action::PageUp => {
                self.view.scroll_up(SCROLL_STEP * 5);
                Step::Continue
            }
            Action::PageDown => {
                self.view.scroll_down(SCROLL_STEP * 5);
                Step::Continue
            }
            Action::Tab => {
                self.on_tab();
                Step::Continue
            }
            Action::Submit => self.submit(now),
            other => {
                self.input.handle_action(&other, width);
                Step::Continue
            }
        }
    }

    fn on_tab(&mut self) {
        if !self.view.is_input_focused() {
            if !self.session.is_pending() {
                self.view.set_input_focused(true);
                self.input.set_focused(true);
            }
            return;
        }

        let draft = self.input.content();
        let draft_is_suggestion = draft.is_empty() || SUGGESTIONS.contains(&draft);
        if self.session.messages().is_empty() && draft_is_suggestion {
            let next = self.suggestion.map_or(0, |i| (i + 1) % SUGGESTIONS.len());
            self.suggestion = Some(next);
            self.input.set_content(SUGGESTIONS[next]);
        }
    }

    fn submit(&mut self, now: Instant) -> Step {
        if !self.view.is_input_focused() {
            return Step::Continue;
        }

        let draft = self.input.content().to_string();
        if let Some(command) = execute_command(&draft) {
            self.input.clear();
            return match command {
                CommandResult::Clear => {
                    self.confirm_clear = true;
                    Step::Continue
                }
                CommandResult::Exit => Step::Quit,
                CommandResult::Message(msg) => {
                    self.overlay = Some(msg);
                    Step::Continue
                }
                CommandResult::Unknown(cmd) => {
                    self.toast = Some(Toast::new(format!("Unknown command: /{cmd}"), now));
                    Step::Continue
                }
            };
        }

        match self.session.submit(&draft) {
            Ok(exchange) => {
                self.input.take();
                self.drain_events(now);
                Step::Dispatch(exchange)
            }
            Err(SubmitError::EmptyInput) | Err(SubmitError::AlreadyInFlight) => Step::Continue,
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let input_height = self.input.desired_height(size.width);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),               // Messages
                Constraint::Length(1),            // Status
                Constraint::Length(input_height), // Input
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input
            .render(chunks[2], frame.buffer_mut(), &self.theme);

        if let Some(toast) = &self.toast {
            toast.render(chunks[0], frame.buffer_mut(), &self.theme);
        }
        if self.confirm_clear {
            self.render_popup(frame, chunks[0], CLEAR_CONFIRM);
        } else if let Some(text) = &self.overlay {
            self.render_popup(frame, chunks[0], text);
        }
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(format!(" {} │ {} ", splash::TITLE, self.title));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }

        let messages = self.session.messages();
        let pending = self.pending_since.is_some();

        if messages.is_empty() && !pending {
            frame.render_widget(self.welcome(), inner);
            return;
        }

        let content_height = calculate_message_height(messages, inner.width as usize, pending);
        let scroll = self.view.layout(content_height, inner.height as usize);

        let message_list = MessageList::new(messages, &self.theme)
            .scroll(scroll)
            .pending(self.pending_since);
        frame.render_widget(message_list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn welcome(&self) -> Paragraph<'static> {
        let mut lines = vec![Line::from("")];
        if self.show_intro {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}", splash::TITLE), self.theme.accent_bold()),
                Span::styled(format!(" - {}", splash::TAGLINE), self.theme.dim_style()),
            ]));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "  How can I help with your meeting?",
            self.theme
                .base_style()
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
            let style = if self.suggestion == Some(i) {
                self.theme.accent_bold()
            } else {
                self.theme.dim_style()
            };
            lines.push(Line::from(Span::styled(format!("    › {suggestion}"), style)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Tab: use a suggestion │ Enter: send │ Shift+Enter: new line",
            self.theme.dim_style(),
        )));
        Paragraph::new(lines)
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some(since) = self.pending_since {
            let spinner =
                Spinner::new("Waiting for reply...", &self.theme).with_start_time(since);
            frame.render_widget(spinner, area);
            return;
        }

        let left_content = self.status.as_str();
        let right_content = "Ctrl+L: clear │ Ctrl+C: quit │ /help";

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(left_content, self.theme.dim_style()),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, self.theme.dim_style()),
            ])
        } else {
            Line::from(Span::styled(left_content, self.theme.dim_style()))
        };

        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_popup(&self, frame: &mut Frame, area: Rect, text: &str) {
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = (longest as u16 + 4).min(area.width);
        let height = (text.lines().count() as u16 + 2).min(area.height);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());
        let paragraph = Paragraph::new(text.to_string())
            .style(self.theme.base_style())
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, popup);
    }
}

/// Run the TUI application
pub async fn run_tui(
    session: ChatSession,
    toasts: mpsc::UnboundedReceiver<String>,
    title: String,
) -> anyhow::Result<()> {
    let mut app = App::new()?;
    let mut state = TuiState::new(session, toasts, title);

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let mut event_stream = EventStream::new();

    // Tick interval for animations and the delayed refocus
    let mut tick_interval = tokio::time::interval(Duration::from_millis(80));

    let result = loop {
        app.draw(|frame| state.render(frame))?;
        let width = app.size()?.width;

        tokio::select! {
            completion = done_rx.recv() => {
                if let Some(completion) = completion {
                    state.on_completion(completion, Instant::now());
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                        MouseEventKind::ScrollUp => state.view.scroll_up(SCROLL_STEP),
                        MouseEventKind::ScrollDown => state.view.scroll_down(SCROLL_STEP),
                        _ => {}
                    },
                    Some(Ok(evt)) => {
                        let Some(action) = event_to_action(evt) else {
                            continue;
                        };
                        match state.handle_action(action, width, Instant::now()) {
                            Step::Continue => {}
                            Step::Quit => break Ok(()),
                            Step::Dispatch(exchange) => {
                                let done_tx = done_tx.clone();
                                tokio::spawn(async move {
                                    // The UI may have quit; the result is dropped then.
                                    let _ = done_tx.send(exchange.run().await);
                                });
                            }
                        }
                    }
                    Some(Err(e)) => {
                        break Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => {
                        break Ok(());
                    }
                }
            }

            _ = tick_interval.tick() => {
                state.tick(Instant::now());
            }
        }
    };

    if state.session().is_pending() {
        tracing::debug!("quitting with an exchange in flight; its result will be discarded");
    }
    drop(app);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_api::ChatClient;
    use huddle_chat::{FAILURE_NOTICE, HttpBackend, Role};
    use huddle_tui::FOCUS_RESTORE_DELAY;
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WIDTH: u16 = 80;

    fn state_for(base_url: &str) -> TuiState {
        let backend = Arc::new(HttpBackend::new(ChatClient::new(base_url)));
        let (notifier, toasts) = crate::notify::ToastNotifier::channel();
        let session = ChatSession::new(backend).with_notifier(Arc::new(notifier));
        TuiState::new(session, toasts, "test")
    }

    fn type_text(state: &mut TuiState, text: &str, now: Instant) {
        for c in text.chars() {
            state.handle_action(Action::Char(c), WIDTH, now);
        }
    }

    fn screen(state: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(WIDTH, 24)).unwrap();
        terminal.draw(|frame| state.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn server_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_tab_cycles_suggestions() {
        let mut state = state_for("http://127.0.0.1:1");
        let now = Instant::now();
        state.handle_action(Action::Tab, WIDTH, now);
        assert_eq!(state.input.content(), SUGGESTIONS[0]);
        state.handle_action(Action::Tab, WIDTH, now);
        assert_eq!(state.input.content(), SUGGESTIONS[1]);

        // A hand-written draft is not replaced.
        state.input.clear();
        type_text(&mut state, "my own", now);
        state.handle_action(Action::Tab, WIDTH, now);
        assert_eq!(state.input.content(), "my own");
    }

    #[test]
    fn test_welcome_screen_lists_suggestions() {
        let mut state = state_for("http://127.0.0.1:1");
        let text = screen(&mut state);
        for suggestion in SUGGESTIONS {
            assert!(text.contains(suggestion), "missing {suggestion}");
        }
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut state = state_for("http://127.0.0.1:1");
        let now = Instant::now();
        type_text(&mut state, "   ", now);
        assert!(matches!(
            state.handle_action(Action::Submit, WIDTH, now),
            Step::Continue
        ));
        assert!(!state.session().is_pending());
        assert!(state.session().messages().is_empty());
    }

    #[tokio::test]
    async fn test_turn_round_trip() {
        let server = server_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Action items: ship it",
            "model_used": "gpt-4o",
            "processing_time_ms": 42,
        })))
        .await;
        let mut state = state_for(&server.uri());
        let start = Instant::now();

        type_text(&mut state, "Extract action items", start);
        let Step::Dispatch(exchange) = state.handle_action(Action::Submit, WIDTH, start) else {
            panic!("expected an exchange");
        };
        assert_eq!(state.input.content(), "");
        assert!(!state.view.is_input_focused());
        assert!(state.pending_since.is_some());

        // Input is blurred while in flight: typing and a second submit do nothing.
        type_text(&mut state, "more", start);
        assert_eq!(state.input.content(), "");
        assert!(matches!(
            state.handle_action(Action::Submit, WIDTH, start),
            Step::Continue
        ));

        let done = start + Duration::from_millis(300);
        state.on_completion(exchange.run().await, done);
        let messages = state.session().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role(), Role::Assistant);
        assert_eq!(messages[1].content(), "Action items: ship it");
        assert!(state.pending_since.is_none());
        assert_eq!(state.status, "gpt-4o │ 42 ms");

        state.tick(done + Duration::from_millis(10));
        assert!(!state.view.is_input_focused());
        state.tick(done + FOCUS_RESTORE_DELAY);
        assert!(state.view.is_input_focused());
        assert!(state.input.is_focused());
        assert!(screen(&mut state).contains("Action items: ship it"));
    }

    #[tokio::test]
    async fn test_failure_shows_toast() {
        let server = server_with(ResponseTemplate::new(502)).await;
        let mut state = state_for(&server.uri());
        let now = Instant::now();

        type_text(&mut state, "Translate to English", now);
        let Step::Dispatch(exchange) = state.handle_action(Action::Submit, WIDTH, now) else {
            panic!("expected an exchange");
        };
        state.on_completion(exchange.run().await, now);

        assert!(state.session().messages()[1].is_fallback());
        let toast = state.toast.as_ref().map(|t| t.message().to_string());
        assert_eq!(toast.as_deref(), Some(FAILURE_NOTICE));
        assert_eq!(state.status, "failed");

        state.tick(now + Duration::from_secs(10));
        assert!(state.toast.is_none());
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let server = server_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "ok",
        })))
        .await;
        let mut state = state_for(&server.uri());
        let now = Instant::now();

        type_text(&mut state, "hello", now);
        let Step::Dispatch(exchange) = state.handle_action(Action::Submit, WIDTH, now) else {
            panic!("expected an exchange");
        };
        state.on_completion(exchange.run().await, now);
        state.tick(now + FOCUS_RESTORE_DELAY);

        state.handle_action(Action::Clear, WIDTH, now);
        assert!(state.confirm_clear);
        assert!(screen(&mut state).contains(CLEAR_CONFIRM));
        state.handle_action(Action::Char('n'), WIDTH, now);
        assert_eq!(state.session().messages().len(), 2);

        type_text(&mut state, "/clear", now);
        state.handle_action(Action::Submit, WIDTH, now);
        assert!(state.confirm_clear);
        state.handle_action(Action::Char('y'), WIDTH, now);
        assert!(state.session().messages().is_empty());
        assert_eq!(state.status, "Cleared");
    }

    #[tokio::test]
    async fn test_quit_discards_in_flight_result() {
        let server = server_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "response": "late" }))
                .set_delay(Duration::from_millis(100)),
        )
        .await;
        let mut state = state_for(&server.uri());
        let now = Instant::now();

        type_text(&mut state, "hello", now);
        let Step::Dispatch(exchange) = state.handle_action(Action::Submit, WIDTH, now) else {
            panic!("expected an exchange");
        };
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let _ = done_tx.send(exchange.run().await);
        });

        assert!(matches!(
            state.handle_action(Action::Quit, WIDTH, now),
            Step::Quit
        ));
        drop(state);

        task.await.unwrap();
        // The completion arrives with nobody left to apply it.
        assert!(done_rx.recv().await.is_some());
    }
}

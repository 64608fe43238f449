//! Message list widget for displaying the conversation

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use crate::widgets::spinner::spinner_frame;
use huddle_chat::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::time::Instant;

/// Label shown while an exchange is in flight
pub const TYPING_LABEL: &str = "thinking...";

/// Who a rendered message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    /// Assistant-role placeholder inserted after a failed exchange
    Fallback,
}

impl Speaker {
    pub fn of(message: &Message) -> Self {
        match message.role() {
            Role::User => Speaker::User,
            Role::Assistant if message.is_fallback() => Speaker::Fallback,
            Role::Assistant => Speaker::Assistant,
        }
    }

    fn header(self, theme: &Theme) -> (&'static str, Style) {
        match self {
            Speaker::User => ("▶ You", theme.accent_bold()),
            Speaker::Assistant => ("◀ Assistant", theme.assistant_bold()),
            Speaker::Fallback => ("◀ Assistant", theme.error_style()),
        }
    }

    fn content_style(self, theme: &Theme) -> Option<Style> {
        match self {
            Speaker::User | Speaker::Assistant => None,
            Speaker::Fallback => Some(theme.error_style()),
        }
    }
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [Message],
    theme: &'a Theme,
    scroll: usize,
    pending_since: Option<Instant>,
}

impl<'a> MessageList<'a> {
    /// Create a new message list
    pub fn new(messages: &'a [Message], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
            pending_since: None,
        }
    }

    /// Set scroll offset (in rendered lines)
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show the typing indicator, animated from `since`
    pub fn pending(mut self, since: Option<Instant>) -> Self {
        self.pending_since = since;
        self
    }
}

fn render_message(msg: &Message, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let speaker = Speaker::of(msg);
    let (label, header_style) = speaker.header(theme);
    let mut lines = vec![Line::from(Span::styled(label, header_style))];

    let content_width = width.saturating_sub(2);
    for line in render_markdown(msg.content(), theme, content_width) {
        let mut spans = vec![Span::raw("  ")];
        match speaker.content_style(theme) {
            Some(style) => spans.extend(line.spans.into_iter().map(|s| s.style(style))),
            None => spans.extend(line.spans),
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines
}

fn typing_lines(theme: &Theme, since: Instant) -> Vec<Line<'static>> {
    let (label, style) = Speaker::Assistant.header(theme);
    vec![
        Line::from(Span::styled(label, style)),
        Line::from(Span::styled(
            format!("  {} {}", spinner_frame(since.elapsed()), TYPING_LABEL),
            theme.dim_style(),
        )),
    ]
}

/// Lines for the whole conversation at `width`
fn layout_lines(
    messages: &[Message],
    theme: &Theme,
    width: usize,
    pending_since: Option<Instant>,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = messages
        .iter()
        .flat_map(|msg| render_message(msg, theme, width))
        .collect();
    if let Some(since) = pending_since {
        lines.extend(typing_lines(theme, since));
    }
    lines
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible: Vec<Line> = layout_lines(
            self.messages,
            self.theme,
            area.width as usize,
            self.pending_since,
        )
        .into_iter()
        .skip(self.scroll)
        .take(area.height as usize)
        .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Calculate the rendered height of the conversation at `width`
pub fn calculate_message_height(messages: &[Message], width: usize, pending: bool) -> usize {
    // Styles do not affect line breaking.
    let theme = Theme::dark();
    let body: usize = messages
        .iter()
        .map(|msg| render_message(msg, &theme, width).len())
        .sum();
    if pending { body + 2 } else { body }
}

//! Transient notification shown over the bottom of the conversation

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use std::time::{Duration, Instant};

/// How long a toast stays on screen
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// A message with an expiry
#[derive(Debug, Clone)]
pub struct Toast {
    message: String,
    expires_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            expires_at: now + TOAST_DURATION,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Wrapped lines at `width` columns of text
    fn lines(&self, width: usize) -> Vec<String> {
        textwrap::wrap(&self.message, width.max(1))
            .into_iter()
            .map(|l| l.into_owned())
            .collect()
    }

    /// Box height (with borders) when rendered inside `width` columns
    pub fn height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(4) as usize;
        self.lines(inner).len() as u16 + 2
    }

    /// Rectangle anchored to the bottom-right of `area`
    pub fn area(&self, area: Rect) -> Rect {
        let width = (self.message.chars().count() as u16 + 4)
            .min(area.width)
            .max(area.width.min(12));
        let height = self.height(width).min(area.height);
        Rect {
            x: area.x + area.width.saturating_sub(width),
            y: area.y + area.height.saturating_sub(height),
            width,
            height,
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let rect = self.area(area);
        if rect.width < 3 || rect.height < 3 {
            return;
        }
        Clear.render(rect, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.error_style());
        let inner = block.inner(rect);
        block.render(rect, buf);

        let lines: Vec<Line> = self
            .lines(inner.width.saturating_sub(2) as usize)
            .into_iter()
            .map(|l| Line::from(Span::styled(format!(" {l}"), theme.error_style())))
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

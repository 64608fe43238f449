//! Multi-line text input widget

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Visible text rows before the box stops growing and scrolls
pub const MAX_INPUT_ROWS: usize = 6;

/// A visual row: chars `start..end` of the draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Row {
    start: usize,
    end: usize,
}

/// Multi-line draft editor that grows with its content
#[derive(Debug, Default)]
pub struct InputBox {
    /// Current draft
    content: String,
    /// Cursor position (character index, not byte index)
    cursor: usize,
    /// First visible row
    scroll: usize,
    placeholder: String,
    focused: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the draft, cursor at the end
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.char_count();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Take the draft, leaving the box empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.scroll = 0;
        std::mem::take(&mut self.content)
    }

    /// Total height including borders for a box `width` columns wide
    pub fn desired_height(&self, width: u16) -> u16 {
        let rows = self.rows(inner_width(width)).len().clamp(1, MAX_INPUT_ROWS);
        rows as u16 + 2
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    /// Break the draft into visual rows at `width` columns
    fn rows(&self, width: usize) -> Vec<Row> {
        let width = width.max(1);
        let mut rows = Vec::new();
        let mut start = 0;
        let mut col = 0;

        for (idx, c) in self.content.chars().enumerate() {
            if c == '\n' {
                rows.push(Row { start, end: idx });
                start = idx + 1;
                col = 0;
                continue;
            }
            let cw = c.width().unwrap_or(0);
            if col + cw > width && idx > start {
                rows.push(Row { start, end: idx });
                start = idx;
                col = 0;
            }
            col += cw;
        }
        rows.push(Row {
            start,
            end: self.char_count(),
        });
        rows
    }

    /// Row index and display column of the cursor
    fn cursor_position(&self, rows: &[Row]) -> (usize, usize) {
        let row = rows
            .iter()
            .rposition(|r| r.start <= self.cursor)
            .unwrap_or(0);
        let col = self
            .content
            .chars()
            .skip(rows[row].start)
            .take(self.cursor - rows[row].start)
            .map(|c| c.width().unwrap_or(0))
            .sum();
        (row, col)
    }

    /// Char index in `row` closest to display column `col`
    fn index_at_column(&self, row: Row, col: usize) -> usize {
        let mut width = 0;
        for (offset, c) in self
            .content
            .chars()
            .skip(row.start)
            .take(row.end - row.start)
            .enumerate()
        {
            let cw = c.width().unwrap_or(0);
            if width + cw > col {
                return row.start + offset;
            }
            width += cw;
        }
        row.end
    }

    /// Apply an editing action. Returns whether the draft or cursor changed.
    ///
    /// Ignored while the box is not focused. `Submit` is left to the caller.
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        if !self.focused {
            return false;
        }

        let char_count = self.char_count();
        let text_width = inner_width(width);

        let changed = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Newline => {
                self.insert_char('\n');
                true
            }
            Action::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_range(self.cursor, self.cursor + 1);
                    true
                } else {
                    false
                }
            }
            Action::Delete => {
                if self.cursor < char_count {
                    self.remove_range(self.cursor, self.cursor + 1);
                    true
                } else {
                    false
                }
            }
            Action::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    true
                } else {
                    false
                }
            }
            Action::Right => {
                if self.cursor < char_count {
                    self.cursor += 1;
                    true
                } else {
                    false
                }
            }
            Action::Up | Action::Down => {
                let rows = self.rows(text_width);
                let (row, col) = self.cursor_position(&rows);
                let target = match action {
                    Action::Up => row.checked_sub(1),
                    _ => Some(row + 1).filter(|r| *r < rows.len()),
                };
                match target {
                    Some(target) => {
                        self.cursor = self.index_at_column(rows[target], col);
                        true
                    }
                    None => false,
                }
            }
            Action::Home | Action::End => {
                let rows = self.rows(text_width);
                let (row, _) = self.cursor_position(&rows);
                self.cursor = match action {
                    Action::Home => rows[row].start,
                    _ => rows[row].end,
                };
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && !chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                let end = self.cursor;
                self.remove_range(start, end);
                self.cursor = start;
                start != end
            }
            Action::Paste(text) => {
                for c in text.replace("\r\n", "\n").chars() {
                    self.insert_char(if c == '\r' { '\n' } else { c });
                }
                true
            }
            _ => false,
        };

        if changed {
            self.update_scroll(text_width);
        }
        changed
    }

    fn insert_char(&mut self, c: char) {
        let byte_offset = self.byte_offset(self.cursor);
        self.content.insert(byte_offset, c);
        self.cursor += 1;
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        let start_byte = self.byte_offset(start);
        let end_byte = self.byte_offset(end);
        self.content.drain(start_byte..end_byte);
    }

    /// Keep the cursor row inside the visible window
    fn update_scroll(&mut self, width: usize) {
        let rows = self.rows(width);
        let visible = rows.len().clamp(1, MAX_INPUT_ROWS);
        let (row, _) = self.cursor_position(&rows);

        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + visible {
            self.scroll = row + 1 - visible;
        }
        self.scroll = self.scroll.min(rows.len().saturating_sub(visible));
    }

    /// Render the input box
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.focused {
                theme.accent_style()
            } else {
                theme.border_style()
            });

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.content.is_empty() {
            Paragraph::new(self.placeholder.as_str())
                .style(theme.dim_style())
                .render(inner, buf);
        } else {
            let chars: Vec<char> = self.content.chars().collect();
            let lines: Vec<Line> = self
                .rows(inner.width as usize)
                .iter()
                .skip(self.scroll)
                .take(inner.height as usize)
                .map(|row| Line::from(chars[row.start..row.end].iter().collect::<String>()))
                .collect();
            Paragraph::new(lines)
                .style(theme.base_style())
                .render(inner, buf);
        }

        if self.focused {
            let rows = self.rows(inner.width as usize);
            let (row, col) = self.cursor_position(&rows);
            let col = col.min(inner.width.saturating_sub(1) as usize);
            if let Some(y) = row.checked_sub(self.scroll).filter(|y| *y < inner.height as usize) {
                let x = inner.x + col as u16;
                let y = inner.y + y as u16;
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}

fn inner_width(width: u16) -> usize {
    width.saturating_sub(2) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focused() -> InputBox {
        let mut input = InputBox::new();
        input.set_focused(true);
        input
    }

    fn type_str(input: &mut InputBox, text: &str, width: u16) {
        for c in text.chars() {
            input.handle_action(&Action::Char(c), width);
        }
    }

    #[test]
    fn test_ignores_input_while_blurred() {
        let mut input = InputBox::new();
        assert!(!input.handle_action(&Action::Char('a'), 20));
        assert_eq!(input.content(), "");
    }

    #[test]
    fn test_newline_and_take() {
        let mut input = focused();
        type_str(&mut input, "line one", 40);
        input.handle_action(&Action::Newline, 40);
        type_str(&mut input, "line two", 40);
        assert_eq!(input.content(), "line one\nline two");

        assert_eq!(input.take(), "line one\nline two");
        assert_eq!(input.content(), "");
        assert_eq!(input.desired_height(40), 3);
    }

    #[test]
    fn test_grows_with_content_and_caps() {
        let mut input = focused();
        assert_eq!(input.desired_height(20), 3);

        input.set_content("a\nb\nc");
        assert_eq!(input.desired_height(20), 5);

        input.set_content("1\n2\n3\n4\n5\n6\n7\n8\n9");
        assert_eq!(input.desired_height(20), MAX_INPUT_ROWS as u16 + 2);
    }

    #[test]
    fn test_long_line_wraps() {
        let mut input = focused();
        input.set_content("abcdefghij");
        // 10 chars in 4 columns: 3 rows
        assert_eq!(input.desired_height(6), 5);
    }

    #[test]
    fn test_scrolls_to_keep_cursor_visible() {
        let mut input = focused();
        for i in 0..10 {
            type_str(&mut input, &i.to_string(), 20);
            input.handle_action(&Action::Newline, 20);
        }
        // 11 rows, cursor on the last one
        assert_eq!(input.scroll, 11 - MAX_INPUT_ROWS);

        for _ in 0..10 {
            input.handle_action(&Action::Up, 20);
        }
        assert_eq!(input.scroll, 0);
    }

    #[test]
    fn test_up_down_keep_column() {
        let mut input = focused();
        input.set_content("hello\nhi\nworld");
        input.handle_action(&Action::Up, 40);
        assert_eq!(input.cursor, 8); // end of "hi"
        input.handle_action(&Action::Up, 40);
        assert_eq!(input.cursor, 2);
        input.handle_action(&Action::Down, 40);
        input.handle_action(&Action::Down, 40);
        assert_eq!(input.cursor, 11);
    }

    #[test]
    fn test_paste_keeps_newlines() {
        let mut input = focused();
        input.handle_action(&Action::Paste("a\r\nb\rc".to_string()), 40);
        assert_eq!(input.content(), "a\nb\nc");
    }

    #[test]
    fn test_delete_word() {
        let mut input = focused();
        type_str(&mut input, "draft a follow-up", 40);
        input.handle_action(&Action::DeleteWord, 40);
        assert_eq!(input.content(), "draft a ");
        input.handle_action(&Action::DeleteWord, 40);
        assert_eq!(input.content(), "draft ");
    }

    #[test]
    fn test_unicode_editing() {
        let mut input = focused();
        type_str(&mut input, "héllo", 40);
        input.handle_action(&Action::Left, 40);
        input.handle_action(&Action::Backspace, 40);
        assert_eq!(input.content(), "hélo");
        input.handle_action(&Action::Home, 40);
        input.handle_action(&Action::Delete, 40);
        assert_eq!(input.content(), "élo");
    }
}

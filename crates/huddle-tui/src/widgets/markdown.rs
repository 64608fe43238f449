//! Markdown rendering for terminal UI

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Convert markdown text to styled lines, wrapped to `width` columns.
///
/// Every returned line fits in `width`, so the line count is the rendered
/// height.
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut out = LineSink::new(width);
    let mut current_line: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![theme.base_style()];
    let mut in_code_block = false;
    let mut code_block_content = String::new();
    let mut list_depth: usize = 0;

    let current_style = |stack: &[Style]| stack.last().copied().unwrap_or_default();

    for event in Parser::new(text) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    out.flush(&mut current_line);
                    let style = match level {
                        HeadingLevel::H1 => theme
                            .accent_style()
                            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                        HeadingLevel::H2 => theme.accent_bold(),
                        _ => theme.accent_style(),
                    };
                    style_stack.push(style);
                }
                Tag::Paragraph => out.flush(&mut current_line),
                Tag::CodeBlock(_) => {
                    out.flush(&mut current_line);
                    in_code_block = true;
                    code_block_content.clear();
                }
                Tag::List(_) => {
                    out.flush(&mut current_line);
                    list_depth += 1;
                }
                Tag::Item => {
                    out.flush(&mut current_line);
                    let indent = "  ".repeat(list_depth.saturating_sub(1));
                    current_line.push(Span::styled(format!("{indent}• "), theme.dim_style()));
                }
                Tag::Emphasis => {
                    let style = current_style(&style_stack).add_modifier(Modifier::ITALIC);
                    style_stack.push(style);
                }
                Tag::Strong => {
                    let style = current_style(&style_stack).add_modifier(Modifier::BOLD);
                    style_stack.push(style);
                }
                Tag::Strikethrough => {
                    let style = current_style(&style_stack).add_modifier(Modifier::CROSSED_OUT);
                    style_stack.push(style);
                }
                Tag::Link { .. } => {
                    style_stack.push(
                        Style::default()
                            .fg(theme.link)
                            .add_modifier(Modifier::UNDERLINED),
                    );
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(_) => {
                    out.flush(&mut current_line);
                    style_stack.pop();
                }
                TagEnd::Paragraph => {
                    out.flush(&mut current_line);
                    out.blank();
                }
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    let code_style = theme.code_style().add_modifier(Modifier::DIM);
                    for code_line in code_block_content.lines() {
                        out.push(vec![Span::styled(format!("  {code_line}"), code_style)]);
                    }
                    out.blank();
                }
                TagEnd::List(_) => {
                    out.flush(&mut current_line);
                    list_depth = list_depth.saturating_sub(1);
                    if list_depth == 0 {
                        out.blank();
                    }
                }
                TagEnd::Item => out.flush(&mut current_line),
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                    style_stack.pop();
                }
                _ => {}
            },
            Event::Text(text) => {
                if in_code_block {
                    code_block_content.push_str(&text);
                } else {
                    current_line.push(Span::styled(text.into_string(), current_style(&style_stack)));
                }
            }
            Event::Code(code) => {
                let style = theme.code_style().add_modifier(Modifier::BOLD);
                current_line.push(Span::styled(format!("`{code}`"), style));
            }
            // Chat input is typed line by line, so single newlines are kept.
            Event::SoftBreak | Event::HardBreak => out.flush(&mut current_line),
            Event::Rule => {
                out.flush(&mut current_line);
                out.push(vec![Span::styled(
                    "─".repeat(width.clamp(1, 40)),
                    theme.dim_style(),
                )]);
            }
            _ => {}
        }
    }

    out.flush(&mut current_line);
    out.finish()
}

/// Collects logical lines and wraps them to the target width
struct LineSink {
    width: usize,
    lines: Vec<Line<'static>>,
}

impl LineSink {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
        }
    }

    fn flush(&mut self, current: &mut Vec<Span<'static>>) {
        if !current.is_empty() {
            self.push(std::mem::take(current));
        }
    }

    fn push(&mut self, spans: Vec<Span<'static>>) {
        self.lines.extend(wrap_spans(spans, self.width));
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Greedy word wrap over styled spans. Words wider than `width` are split
/// at character boundaries; spaces at a break are dropped.
pub fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let total: usize = spans.iter().map(|s| s.content.width()).sum();
    if width == 0 || total <= width {
        return vec![Line::from(spans)];
    }

    let mut lines = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut line_width = 0;
    let mut pending = String::new();
    let mut pending_style = Style::default();

    for span in spans {
        let style = span.style;
        for word in span.content.split_inclusive(' ') {
            let text = word.trim_end_matches(' ');
            let spaces = &word[text.len()..];
            let text_width = text.width();

            if text_width > 0 {
                if line_width > 0 && line_width + pending.width() + text_width > width {
                    lines.push(Line::from(std::mem::take(&mut line)));
                    line_width = 0;
                    pending.clear();
                }
                if !pending.is_empty() && line_width + pending.width() + text_width <= width {
                    push_text(&mut line, &pending, pending_style);
                    line_width += pending.width();
                }
                pending.clear();

                if text_width <= width - line_width {
                    push_text(&mut line, text, style);
                    line_width += text_width;
                } else {
                    for c in text.chars() {
                        let cw = c.width().unwrap_or(0);
                        if line_width > 0 && line_width + cw > width {
                            lines.push(Line::from(std::mem::take(&mut line)));
                            line_width = 0;
                        }
                        push_text(&mut line, c.encode_utf8(&mut [0; 4]), style);
                        line_width += cw;
                    }
                }
            }

            if !spaces.is_empty() {
                pending.push_str(spaces);
                pending_style = style;
            }
        }
    }

    if !line.is_empty() {
        lines.push(Line::from(line));
    }
    lines
}

fn push_text(line: &mut Vec<Span<'static>>, text: &str, style: Style) {
    match line.last_mut() {
        Some(last) if last.style == style => last.content.to_mut().push_str(text),
        _ => line.push(Span::styled(text.to_string(), style)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_simple_text() {
        let theme = Theme::dark();
        let lines = render_markdown("Hello, world!", &theme, 80);
        assert_eq!(plain(&lines), vec!["Hello, world!"]);
    }

    #[test]
    fn test_code_block() {
        let theme = Theme::dark();
        let md = "```rust\nfn main() {}\n```";
        let lines = render_markdown(md, &theme, 80);
        assert_eq!(plain(&lines), vec!["  fn main() {}"]);
    }

    #[test]
    fn test_wraps_to_width() {
        let theme = Theme::dark();
        let lines = render_markdown("one two three four five six", &theme, 10);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width() <= 10));
    }

    #[test]
    fn test_long_word_is_split() {
        let theme = Theme::dark();
        let lines = render_markdown("abcdefghijklmnopqrstuvwxyz", &theme, 8);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.width() <= 8));
    }

    #[test]
    fn test_wide_code_line_does_not_panic() {
        let theme = Theme::dark();
        let md = "```\nléngthy ünïcode cöde line that exceeds the width\n```";
        let lines = render_markdown(md, &theme, 12);
        assert!(lines.iter().all(|l| l.width() <= 12));
    }

    #[test]
    fn test_line_breaks_kept() {
        let theme = Theme::dark();
        let lines = render_markdown("first\nsecond", &theme, 80);
        assert_eq!(plain(&lines), vec!["first", "second"]);
    }

    #[test]
    fn test_list_items() {
        let theme = Theme::dark();
        let lines = render_markdown("- a\n- b", &theme, 80);
        assert_eq!(plain(&lines), vec!["• a", "• b"]);
    }
}

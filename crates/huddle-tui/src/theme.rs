//! Color theme support

use ratatui::style::{Color, Modifier, Style};

/// Color theme for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub bg: Color,
    /// Primary text color
    pub fg: Color,
    /// Dimmed/secondary text
    pub dim: Color,
    /// Accent color (focus, headings, user label)
    pub accent: Color,
    /// Assistant label
    pub assistant: Color,
    /// Errors, fallback replies and failure toasts
    pub error: Color,
    /// Border color
    pub border: Color,
    /// Code/preformatted text color
    pub code: Color,
    /// Link color
    pub link: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            dim: Color::DarkGray,
            accent: Color::Indexed(105),
            assistant: Color::Cyan,
            error: Color::Red,
            border: Color::DarkGray,
            code: Color::Magenta,
            link: Color::Blue,
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            bg: Color::White,
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Indexed(55),
            assistant: Color::Blue,
            error: Color::Red,
            border: Color::Gray,
            code: Color::Magenta,
            link: Color::Blue,
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn accent_bold(&self) -> Style {
        self.accent_style().add_modifier(Modifier::BOLD)
    }

    pub fn assistant_bold(&self) -> Style {
        Style::default()
            .fg(self.assistant)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn code_style(&self) -> Style {
        Style::default().fg(self.code)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }
}

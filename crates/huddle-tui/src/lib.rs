//! huddle-tui: Terminal UI components
//!
//! Widgets and view state for the chat, built on ratatui and crossterm.

pub mod app;
pub mod input;
pub mod theme;
pub mod view_sync;
pub mod widgets;

pub use app::App;
pub use theme::Theme;
pub use view_sync::{FOCUS_RESTORE_DELAY, ViewSync};

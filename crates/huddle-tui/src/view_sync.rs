//! Keeps the view in step with the conversation.
//!
//! Translates [`ChatEvent`]s into scroll position and input focus. Scroll
//! requests are deferred to the next [`ViewSync::layout`] call so they see
//! the height that includes the new message.

use huddle_chat::ChatEvent;
use std::time::{Duration, Instant};

/// Delay between the end of a turn and the input regaining focus
pub const FOCUS_RESTORE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ViewSync {
    offset: usize,
    max_offset: usize,
    /// Pinned to the bottom; paused by manual scrolling
    follow: bool,
    scroll_to_end: bool,
    input_focused: bool,
    refocus_at: Option<Instant>,
}

impl Default for ViewSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSync {
    pub fn new() -> Self {
        Self {
            offset: 0,
            max_offset: 0,
            follow: true,
            scroll_to_end: false,
            input_focused: true,
            refocus_at: None,
        }
    }

    pub fn on_event(&mut self, event: &ChatEvent, now: Instant) {
        match event {
            ChatEvent::MessageAppended { .. } => self.scroll_to_end = true,
            ChatEvent::TurnStarted { .. } => {
                self.input_focused = false;
                self.refocus_at = None;
            }
            ChatEvent::TurnCompleted { .. } => {
                self.refocus_at = Some(now + FOCUS_RESTORE_DELAY);
            }
            ChatEvent::Cleared { .. } => {
                self.offset = 0;
                self.max_offset = 0;
                self.follow = true;
                self.scroll_to_end = false;
            }
        }
    }

    /// Apply a due focus restoration. Returns true if focus changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.refocus_at {
            Some(at) if now >= at => {
                self.refocus_at = None;
                let changed = !self.input_focused;
                self.input_focused = true;
                changed
            }
            _ => false,
        }
    }

    /// Time of the pending focus restoration, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.refocus_at
    }

    /// Resolve the scroll offset for this frame
    pub fn layout(&mut self, content_height: usize, viewport_height: usize) -> usize {
        self.max_offset = content_height.saturating_sub(viewport_height);
        if std::mem::take(&mut self.scroll_to_end) {
            self.follow = true;
        }
        self.offset = if self.follow {
            self.max_offset
        } else {
            self.offset.min(self.max_offset)
        };
        self.offset
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
        if self.offset < self.max_offset {
            self.follow = false;
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset);
        if self.offset == self.max_offset {
            self.follow = true;
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    /// Focus or blur the input directly. Cancels a scheduled restoration.
    pub fn set_input_focused(&mut self, focused: bool) {
        self.input_focused = focused;
        self.refocus_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_chat::{ConversationStore, MessageKind, NewMessage, Role, TurnOutcome};

    fn appended(store: &mut ConversationStore) -> ChatEvent {
        let id = store.append(NewMessage::user("hello")).unwrap();
        ChatEvent::MessageAppended {
            id,
            role: Role::User,
            kind: MessageKind::Reply,
        }
    }

    #[test]
    fn test_scroll_to_end_waits_for_layout() {
        let mut sync = ViewSync::new();
        let mut store = ConversationStore::default();
        assert_eq!(sync.layout(10, 20), 0);

        sync.scroll_up(1);
        sync.on_event(&appended(&mut store), Instant::now());
        // Nothing moves until the next layout pass sees the new height.
        assert_eq!(sync.offset(), 0);
        assert_eq!(sync.layout(50, 20), 30);
        assert!(sync.is_following());
    }

    #[test]
    fn test_manual_scroll_pauses_follow() {
        let mut sync = ViewSync::new();
        assert_eq!(sync.layout(50, 20), 30);

        sync.scroll_up(5);
        assert!(!sync.is_following());
        assert_eq!(sync.layout(60, 20), 25);

        sync.scroll_down(100);
        assert!(sync.is_following());
        assert_eq!(sync.layout(70, 20), 50);
    }

    #[test]
    fn test_new_message_resumes_follow() {
        let mut sync = ViewSync::new();
        let mut store = ConversationStore::default();
        sync.layout(50, 20);
        sync.scroll_up(10);
        sync.on_event(&appended(&mut store), Instant::now());
        assert_eq!(sync.layout(55, 20), 35);
    }

    #[test]
    fn test_focus_restored_after_delay() {
        let mut sync = ViewSync::new();
        let start = Instant::now();

        sync.on_event(&ChatEvent::TurnStarted { turn: 1 }, start);
        assert!(!sync.is_input_focused());

        let done = start + Duration::from_millis(500);
        sync.on_event(
            &ChatEvent::TurnCompleted {
                turn: 1,
                outcome: TurnOutcome::Failed,
            },
            done,
        );
        assert!(!sync.tick(done + Duration::from_millis(50)));
        assert!(!sync.is_input_focused());

        assert!(sync.tick(done + FOCUS_RESTORE_DELAY));
        assert!(sync.is_input_focused());
        assert_eq!(sync.next_deadline(), None);
    }

    #[test]
    fn test_clear_resets_scroll() {
        let mut sync = ViewSync::new();
        sync.layout(80, 20);
        sync.scroll_up(10);
        sync.on_event(&ChatEvent::Cleared { removed: 4 }, Instant::now());
        assert_eq!(sync.offset(), 0);
        assert!(sync.is_following());
        assert_eq!(sync.layout(0, 20), 0);
    }
}

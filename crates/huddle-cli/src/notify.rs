//! Failure notices for each front end

use huddle_chat::Notifier;
use tokio::sync::mpsc;

/// Forwards notices to the TUI, which shows them as toasts
#[derive(Debug, Clone)]
pub struct ToastNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl ToastNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ToastNotifier {
    fn failure(&self, message: &str) {
        // The UI may already be gone; the notice is dropped then.
        let _ = self.tx.send(message.to_string());
    }
}

/// Prints notices to stderr for line and one-shot modes
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn failure(&self, message: &str) {
        eprintln!("[{message}]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_notifier_forwards() {
        let (notifier, mut rx) = ToastNotifier::channel();
        notifier.failure("Failed to send message");
        assert_eq!(rx.try_recv().unwrap(), "Failed to send message");
    }

    #[test]
    fn test_toast_notifier_after_ui_closed() {
        let (notifier, rx) = ToastNotifier::channel();
        drop(rx);
        notifier.failure("Failed to send message");
    }
}

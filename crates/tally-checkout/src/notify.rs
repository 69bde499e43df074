//! # Notifications
//!
//! User-facing notification events emitted by the engine. Display layers
//! decide how to render them (toast, status line, printer beep); the
//! engine only decides *what* to say.

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Notification kind; maps onto the display layer's styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    /// A transaction was captured offline. Distinct from Success so the
    /// cashier can tell the customer the receipt is pending sync.
    Offline,
}

/// A user-facing notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn offline(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Offline,
            message: message.into(),
        }
    }
}

/// Sink for notifications.
///
/// Implementations must be cheap and non-blocking: the engine emits
/// notifications from inside the submission path.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Drops all notifications. Useful for headless batch contexts.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Emits notifications to the tracing log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(message = %notification.message, "notification"),
            NotificationKind::Offline => warn!(message = %notification.message, "offline notification"),
            NotificationKind::Warning => warn!(message = %notification.message, "notification"),
            NotificationKind::Error => warn!(message = %notification.message, "error notification"),
        }
    }
}

/// Forwards notifications over a channel to a display layer.
///
/// Uses an unbounded sender so `notify` never blocks; a display layer
/// that went away simply stops receiving.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Creates the notifier and the receiving end for the display layer.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Notification::success("ok").kind, NotificationKind::Success);
        assert_eq!(Notification::warning("hm").kind, NotificationKind::Warning);
        assert_eq!(Notification::error("no").kind, NotificationKind::Error);
        assert_eq!(Notification::offline("later").kind, NotificationKind::Offline);
    }

    #[tokio::test]
    async fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Notification::success("committed"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NotificationKind::Success);
        assert_eq!(received.message, "committed");
    }

    #[test]
    fn test_channel_notifier_survives_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        // Must not panic
        notifier.notify(Notification::error("nobody listening"));
    }
}

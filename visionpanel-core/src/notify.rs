//! User-facing notifications and confirmations.

use std::time::Duration;

use async_trait::async_trait;

/// Default on-screen time for a notification.
pub const DEFAULT_NOTIFY_DURATION: Duration = Duration::from_secs(3);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyLevel {
    Error,
    Info,
    Success,
}

impl std::fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Where the panel sends messages meant for the user.
///
/// `confirm` is modal: the front end blocks the rest of the panel until the
/// user answers. A prompt that can no longer be answered resolves to `false`.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str, duration: Duration);

    async fn confirm(&self, message: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    #[test]
    fn test_level_display() {
        assert_eq!(NotifyLevel::Error.to_string(), "error");
        assert_eq!(NotifyLevel::Success.to_string(), "success");
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sink: Box<dyn NotificationSink> = Box::new(RecordingSink::new(false));
        sink.notify(NotifyLevel::Info, "hello", DEFAULT_NOTIFY_DURATION);
        assert!(!tokio_test::block_on(sink.confirm("Proceed?")));
    }
}

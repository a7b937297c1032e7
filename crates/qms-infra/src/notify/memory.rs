//! Notifier that keeps every notification in memory.

use std::sync::Mutex;

use qms_core::ports::{NotificationLevel, Notifier};

/// Records notifications so callers (and tests) can inspect what the
/// operator would have been shown.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    history: Mutex<Vec<(NotificationLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<(NotificationLevel, String)> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Most recent message at `level`.
    pub fn last(&self, level: NotificationLevel) -> Option<String> {
        self.history()
            .into_iter()
            .rev()
            .find(|(l, _)| *l == level)
            .map(|(_, message)| message)
    }

    pub fn clear(&self) {
        if let Ok(mut history) = self.history.lock() {
            history.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.success("Login successful!");
        notifier.error("Failed to update CMS.");
        notifier.info("Logged out successfully");

        assert_eq!(notifier.history().len(), 3);
        assert_eq!(
            notifier.last(NotificationLevel::Error).as_deref(),
            Some("Failed to update CMS.")
        );
    }
}

//! Notifier that writes every notification to the log.

use qms_core::ports::{NotificationLevel, Notifier};

/// Logs notifications through `tracing`, the notification surface of the
/// headless console.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!(target: "qms::notify", level = ?level, "{}", message)
            }
            NotificationLevel::Warning => {
                tracing::warn!(target: "qms::notify", "{}", message)
            }
            NotificationLevel::Error => {
                tracing::error!(target: "qms::notify", "{}", message)
            }
        }
    }
}

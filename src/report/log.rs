//! Log-only notifier for dry runs and missing credentials

use super::{NotifyError, Notifier};
use async_trait::async_trait;

/// Writes messages to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!(text = %text, "Notification not delivered (log only)");
        Ok(())
    }
}

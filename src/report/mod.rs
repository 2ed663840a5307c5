//! Reporting
//!
//! Message formatting for both run modes and delivery through a notifier.

mod format;
mod log;
mod telegram;

pub use format::{
    format_price, format_signed, initial_message, should_send_digest, top_cheapest,
    unreadable_message, update_message, MonthDigest, MonthSummary, RouteLabel, MAX_CHANGE_LINES,
    TOP_DAYS,
};
pub use log::LogNotifier;
pub use telegram::{TelegramConfig, TelegramNotifier, TELEGRAM_API_URL};

use async_trait::async_trait;
use thiserror::Error;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status
    #[error("rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Endpoint accepted the request but reported a failure
    #[error("api error: {0}")]
    Api(String),
}

/// Trait for notification transports
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

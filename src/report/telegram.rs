//! Telegram Bot API notifier

use super::{NotifyError, Notifier};
use crate::fetch::truncate;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Configuration for the Telegram notifier
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// API base URL
    pub api_base: String,
    /// Bot token
    pub bot_token: String,
    /// Target chat id
    pub chat_id: String,
    /// Request timeout
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Create a config for the public Bot API
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: TELEGRAM_API_URL.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `sendMessage` form body
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Envelope returned by every Bot API method
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages through a Telegram bot
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    /// Create a notifier
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// `sendMessage` endpoint for the configured bot
    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn request<'a>(&'a self, text: &'a str) -> SendMessageRequest<'a> {
        SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint())
            .form(&self.request(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %truncate(&body, 300), "Telegram response");

        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status,
                body: truncate(&body, 300).to_string(),
            });
        }

        match serde_json::from_str::<TelegramResponse>(&body) {
            Ok(TelegramResponse { ok: false, description }) => Err(NotifyError::Api(
                description.unwrap_or_else(|| "unknown error".to_string()),
            )),
            // A 2xx body we cannot parse is treated as delivered
            _ => Ok(()),
        }
    }
}

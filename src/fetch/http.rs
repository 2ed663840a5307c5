//! Plain HTTP page fetcher
//!
//! For search pages that are server-rendered, or for mirrors that return the
//! fares without running scripts. No idle wait applies.

use super::{FetchError, PageFetcher, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Fetches raw page text with a GET request
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default user agent and locale
    pub fn new() -> Self {
        Self::with_identity(DEFAULT_USER_AGENT, "vi-VN")
    }

    /// Create a fetcher with a custom user agent and `Accept-Language`
    pub fn with_identity(user_agent: &str, locale: &str) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(locale) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn render(
        &self,
        url: &str,
        page_timeout: Duration,
        _idle_timeout: Duration,
    ) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "Fetching page over HTTP");

        let response = self
            .client
            .get(url)
            .timeout(page_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(page_timeout)
                } else {
                    FetchError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        Ok(response.text().await?)
    }
}

//! Page fetching
//!
//! Renders the airline's search page and hands back its text. The browser
//! itself is an external program; this module only drives it.

mod chrome;
mod http;
mod query;

pub use chrome::{ChromeFetcher, ChromeOptions};
pub(crate) use chrome::truncate;
pub use http::HttpFetcher;
pub use query::SearchQuery;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Desktop user agent sent to the airline site
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Page fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Page did not finish loading within the page timeout
    #[error("page load timed out after {0:?}")]
    Timeout(Duration),
    /// Browser process could not be started
    #[error("failed to launch browser {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    /// Browser exited unsuccessfully
    #[error("browser exited with {status}: {stderr}")]
    BrowserExit { status: String, stderr: String },
    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Trait for page rendering implementations
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and return its rendered text
    ///
    /// `page_timeout` is a hard limit. Failing to reach network idle within
    /// `idle_timeout` is not an error: whatever has rendered is returned.
    async fn render(
        &self,
        url: &str,
        page_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<String, FetchError>;
}

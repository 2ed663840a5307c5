//! Headless Chromium page renderer
//!
//! Runs the browser once per page with `--dump-dom`. The network-idle wait
//! maps onto `--virtual-time-budget`, which lets scripts settle for up to
//! that long and then dumps whatever DOM exists.

use super::{FetchError, PageFetcher, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use uuid::Uuid;

/// Options for launching the browser
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Browser executable (name on PATH or absolute path)
    pub binary: String,
    /// User agent override
    pub user_agent: String,
    /// Browser UI/content language, e.g. "vi-VN"
    pub locale: String,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            binary: "chromium".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "vi-VN".to_string(),
        }
    }
}

/// Renders pages with a headless Chromium child process
///
/// All renders share one profile directory so cookies and cache carry over
/// between probes of the same run. The directory is removed on drop.
pub struct ChromeFetcher {
    options: ChromeOptions,
    profile_dir: PathBuf,
}

impl ChromeFetcher {
    /// Create a fetcher with a fresh profile directory
    pub fn new(options: ChromeOptions) -> Self {
        let profile_dir = std::env::temp_dir().join(format!("fare-watch-{}", Uuid::new_v4()));
        Self {
            options,
            profile_dir,
        }
    }

    /// Profile directory shared by every render of this fetcher
    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Command-line arguments for one render
    fn build_args(&self, url: &str, idle_timeout: Duration) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", self.options.user_agent),
            format!("--lang={}", self.options.locale),
            format!("--user-data-dir={}", self.profile_dir.display()),
            format!("--virtual-time-budget={}", idle_timeout.as_millis()),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }
}

impl Default for ChromeFetcher {
    fn default() -> Self {
        Self::new(ChromeOptions::default())
    }
}

impl Drop for ChromeFetcher {
    fn drop(&mut self) {
        if self.profile_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
                tracing::debug!(path = ?self.profile_dir, error = %e, "Failed to remove browser profile");
            }
        }
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn render(
        &self,
        url: &str,
        page_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<String, FetchError> {
        tracing::debug!(url = %url, binary = %self.options.binary, "Rendering page");

        let child = Command::new(&self.options.binary)
            .args(self.build_args(url, idle_timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Launch {
                binary: self.options.binary.clone(),
                source,
            })?;

        // Dropping the wait future on timeout kills the child
        let output = match tokio::time::timeout(page_timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| FetchError::Launch {
                binary: self.options.binary.clone(),
                source,
            })?,
            Err(_) => return Err(FetchError::Timeout(page_timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::BrowserExit {
                status: output.status.to_string(),
                stderr: truncate(&stderr, 400).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Truncate to at most `max` bytes on a char boundary
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

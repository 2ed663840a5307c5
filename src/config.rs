//! Configuration types for fare-watch
//!
//! Values come from a TOML file, then environment variables (the names a
//! scheduled CI job sets), then CLI flags.

use crate::telemetry::LogFormat;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
    /// Configuration is inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub commit: CommitConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Route being watched
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Departure date for single-date runs
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Year for month runs
    #[serde(default)]
    pub year: Option<i32>,
    /// Month (1-12) for month runs
    #[serde(default)]
    pub month: Option<u32>,
}

fn default_origin() -> String {
    "HAN".to_string()
}
fn default_destination() -> String {
    "SGN".to_string()
}
fn default_currency() -> String {
    "VND".to_string()
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            destination: default_destination(),
            currency: default_currency(),
            date: None,
            year: None,
            month: None,
        }
    }
}

/// How pages are fetched
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Headless Chromium
    #[default]
    Chrome,
    /// Plain HTTP GET
    Http,
}

/// Fare source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Search page URL without query string
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default)]
    pub fetcher: FetcherKind,
    /// Browser executable
    #[serde(default = "default_chrome_binary")]
    pub chrome_binary: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Airline name shown in messages
    #[serde(default = "default_carrier")]
    pub carrier: String,
    /// Monthly fare calendar link appended to month digests
    #[serde(default)]
    pub calendar_link: Option<String>,
}

fn default_search_url() -> String {
    "https://www.vietjetair.com/vi/search".to_string()
}
fn default_chrome_binary() -> String {
    "chromium".to_string()
}
fn default_user_agent() -> String {
    crate::fetch::DEFAULT_USER_AGENT.to_string()
}
fn default_locale() -> String {
    "vi-VN".to_string()
}
fn default_carrier() -> String {
    "VietJet".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            fetcher: FetcherKind::default(),
            chrome_binary: default_chrome_binary(),
            user_agent: default_user_agent(),
            locale: default_locale(),
            carrier: default_carrier(),
            calendar_link: None,
        }
    }
}

/// Timing knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Hard limit for one page load
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,
    /// Soft wait for the page to settle
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Pause between month probes
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,
    /// Wall-clock budget for a month run
    #[serde(default = "default_month_budget_secs")]
    pub month_budget_secs: u64,
}

fn default_page_timeout_ms() -> u64 {
    120_000
}
fn default_idle_timeout_ms() -> u64 {
    15_000
}
fn default_probe_delay_ms() -> u64 {
    800
}
fn default_month_budget_secs() -> u64 {
    2_400 // 40 minutes
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_timeout_ms: default_page_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            probe_delay_ms: default_probe_delay_ms(),
            month_budget_secs: default_month_budget_secs(),
        }
    }
}

impl TimingConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn month_budget(&self) -> Duration {
        Duration::from_secs(self.month_budget_secs)
    }
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Send the month digest even when nothing changed
    #[serde(default)]
    pub always_send: bool,
    /// Minimum drop to notify on; 0 notifies on any change
    #[serde(default)]
    pub price_drop_threshold: u64,
}

fn default_api_base() -> String {
    crate::report::TELEGRAM_API_URL.to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_api_base(),
            always_send: false,
            price_drop_threshold: 0,
        }
    }
}

impl NotifyConfig {
    /// Bot token and chat id, when both are set and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().filter(|s| !s.is_empty())?;
        let chat = self.chat_id.as_deref().filter(|s| !s.is_empty())?;
        Some((token, chat))
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}
fn default_file_prefix() -> String {
    "vietjet".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Durable commit configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub push: bool,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            push: true,
            author_name: None,
            author_email: None,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus text file written at the end of a run
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BOT_TOKEN") {
            self.notify.bot_token = Some(v);
        }
        if let Some(v) = get("CHAT_ID") {
            self.notify.chat_id = Some(v);
        }
        if let Some(v) = get("ORIGIN") {
            self.route.origin = v;
        }
        if let Some(v) = get("DEST") {
            self.route.destination = v;
        }
        if let Some(v) = get("CURRENCY") {
            self.route.currency = v;
        }
        if let Some(v) = get("DATE") {
            self.route.date = Some(parse_env("DATE", &v)?);
        }
        if let Some(v) = get("YEAR") {
            self.route.year = Some(parse_env("YEAR", &v)?);
        }
        if let Some(v) = get("MONTH") {
            self.route.month = Some(parse_env("MONTH", &v)?);
        }
        if let Some(v) = get("ALWAYS_SEND") {
            self.notify.always_send = parse_flag(&v);
        }
        if let Some(v) = get("PRICE_DROP_NOTIFY") {
            self.notify.price_drop_threshold = parse_env("PRICE_DROP_NOTIFY", &v)?;
        }
        if let Some(v) = get("PAGE_TIMEOUT_MS") {
            self.timing.page_timeout_ms = parse_env("PAGE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("IDLE_TIMEOUT_MS") {
            self.timing.idle_timeout_ms = parse_env("IDLE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("PROBE_DELAY_MS") {
            self.timing.probe_delay_ms = parse_env("PROBE_DELAY_MS", &v)?;
        }
        if let Some(v) = get("MONTH_BUDGET_SECS") {
            self.timing.month_budget_secs = parse_env("MONTH_BUDGET_SECS", &v)?;
        }
        if let Some(v) = get("STATE_DIR") {
            self.store.state_dir = PathBuf::from(v);
        }
        if let Some(v) = get("GIT_COMMIT") {
            self.commit.enabled = parse_flag(&v);
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.telemetry.log_level = v;
        }

        Ok(())
    }

    /// Check the route fields shared by both modes
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, code) in [
            ("origin", &self.route.origin),
            ("destination", &self.route.destination),
            ("currency", &self.route.currency),
        ] {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-empty alphanumeric code, got {code:?}"
                )));
            }
        }
        if self.route.origin == self.route.destination {
            return Err(ConfigError::Invalid(
                "origin and destination must differ".to_string(),
            ));
        }
        if self.timing.page_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "page_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Departure date for a single-date run
    pub fn target_date(&self) -> Result<NaiveDate, ConfigError> {
        self.route
            .date
            .ok_or_else(|| ConfigError::Invalid("no departure date (set DATE or --date)".to_string()))
    }

    /// (year, month) for a month run
    pub fn target_month(&self) -> Result<(i32, u32), ConfigError> {
        let year = self
            .route
            .year
            .ok_or_else(|| ConfigError::Invalid("no year (set YEAR or --year)".to_string()))?;
        let month = self
            .route
            .month
            .ok_or_else(|| ConfigError::Invalid("no month (set MONTH or --month)".to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(ConfigError::Invalid(format!(
                "month must be 1-12, got {month}"
            )));
        }
        Ok((year, month))
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Only a case-insensitive "true" enables a flag
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

//! CLI interface for fare-watch
//!
//! Provides subcommands for:
//! - `watch`: Watch one departure date
//! - `month`: Watch every departure date of a month
//! - `extract`: Run the price extractor over a saved page
//! - `config`: Show the effective configuration

mod extract;
mod month;
mod watch;

pub use extract::ExtractArgs;
pub use month::MonthArgs;
pub use watch::WatchArgs;

use crate::config::Config;
use crate::watch::RunFlags;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fare-watch")]
#[command(about = "Watch airline fares and report price changes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch one departure date
    Watch(WatchArgs),
    /// Watch every departure date of a month
    Month(MonthArgs),
    /// Run the price extractor over a saved page
    Extract(ExtractArgs),
    /// Show the effective configuration
    Config,
}

/// Flags shared by the watch modes
#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// Minimum drop to notify on (0 notifies on any change)
    #[arg(long)]
    pub threshold: Option<u64>,

    /// Log messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the git commit
    #[arg(long)]
    pub no_commit: bool,
}

impl RunOptions {
    /// Apply flag overrides on top of file and environment values
    pub fn apply(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.notify.price_drop_threshold = threshold;
        }
    }

    pub fn flags(&self) -> RunFlags {
        RunFlags {
            dry_run: self.dry_run,
            no_commit: self.no_commit,
        }
    }
}

/// Render configuration as TOML with credentials masked
pub fn redacted_config(config: &Config) -> anyhow::Result<String> {
    let mut shown = config.clone();
    for secret in [&mut shown.notify.bot_token, &mut shown.notify.chat_id] {
        if secret.is_some() {
            *secret = Some("***".to_string());
        }
    }
    Ok(toml::to_string_pretty(&shown)?)
}

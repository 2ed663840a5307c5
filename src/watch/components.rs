//! Pipeline components built from configuration

use crate::commit::{DurableCommit, GitCommitter, GitOptions, NoopCommitter};
use crate::config::{Config, FetcherKind};
use crate::extract::{PriceExtractor, RegexExtractor};
use crate::fetch::{ChromeFetcher, ChromeOptions, HttpFetcher, PageFetcher};
use crate::report::{LogNotifier, Notifier, TelegramConfig, TelegramNotifier};
use crate::snapshot::{FileStore, SnapshotStore};
use std::path::PathBuf;

/// The external collaborators of one run
pub struct Components {
    pub fetcher: Box<dyn PageFetcher>,
    pub extractor: Box<dyn PriceExtractor>,
    pub store: Box<dyn SnapshotStore>,
    pub notifier: Box<dyn Notifier>,
    pub committer: Box<dyn DurableCommit>,
}

/// Run-level switches that override configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    /// Log messages instead of delivering them
    pub dry_run: bool,
    /// Skip the durable commit
    pub no_commit: bool,
}

impl Components {
    /// Build production components from configuration
    pub fn from_config(config: &Config, flags: RunFlags) -> Self {
        Self {
            fetcher: build_fetcher(config),
            extractor: Box::new(RegexExtractor::new()),
            store: Box::new(FileStore::new(
                config.store.state_dir.clone(),
                config.store.file_prefix.clone(),
            )),
            notifier: build_notifier(config, flags.dry_run),
            committer: build_committer(config, flags.no_commit),
        }
    }
}

fn build_fetcher(config: &Config) -> Box<dyn PageFetcher> {
    let source = &config.source;
    match source.fetcher {
        FetcherKind::Chrome => Box::new(ChromeFetcher::new(ChromeOptions {
            binary: source.chrome_binary.clone(),
            user_agent: source.user_agent.clone(),
            locale: source.locale.clone(),
        })),
        FetcherKind::Http => Box::new(HttpFetcher::with_identity(
            &source.user_agent,
            &source.locale,
        )),
    }
}

fn build_notifier(config: &Config, dry_run: bool) -> Box<dyn Notifier> {
    if dry_run {
        return Box::new(LogNotifier::new());
    }
    match config.notify.credentials() {
        Some((token, chat_id)) => {
            let mut telegram = TelegramConfig::new(token, chat_id);
            telegram.api_base = config.notify.api_base.clone();
            Box::new(TelegramNotifier::new(telegram))
        }
        None => {
            tracing::warn!("Missing BOT_TOKEN/CHAT_ID, notifications will only be logged");
            Box::new(LogNotifier::new())
        }
    }
}

fn build_committer(config: &Config, no_commit: bool) -> Box<dyn DurableCommit> {
    if no_commit || !config.commit.enabled {
        return Box::new(NoopCommitter);
    }
    Box::new(GitCommitter::new(GitOptions {
        repo_dir: PathBuf::from("."),
        paths: vec![config.store.state_dir.clone()],
        push: config.commit.push,
        author_name: config.commit.author_name.clone(),
        author_email: config.commit.author_email.clone(),
    }))
}

//! Watch runs
//!
//! One run probes the search page for one date or every date of a month,
//! diffs against the stored snapshot, notifies, persists and commits.
//! Probes are strictly sequential; a failed probe only loses that date.

mod components;

pub use components::{Components, RunFlags};

use crate::commit::CommitOutcome;
use crate::config::Config;
use crate::detect::{detect_changes, ChangeRecord, DropThreshold};
use crate::fetch::SearchQuery;
use crate::report::{
    initial_message, should_send_digest, unreadable_message, update_message, MonthDigest,
    RouteLabel,
};
use crate::snapshot::{PriceSnapshot, SnapshotKey, TIMESTAMP_FORMAT};
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use crate::Price;
use chrono::{NaiveDate, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Per-run policy and timing
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub threshold: DropThreshold,
    /// Send the month digest even without changes
    pub always_send: bool,
    pub page_timeout: Duration,
    pub idle_timeout: Duration,
    /// Pause after each month probe
    pub probe_delay: Duration,
    /// Wall-clock budget for a month run
    pub month_budget: Duration,
    pub calendar_link: Option<String>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            threshold: DropThreshold::default(),
            always_send: false,
            page_timeout: Duration::from_secs(120),
            idle_timeout: Duration::from_secs(15),
            probe_delay: Duration::from_millis(800),
            month_budget: Duration::from_secs(2_400),
            calendar_link: None,
        }
    }
}

impl WatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: DropThreshold(config.notify.price_drop_threshold),
            always_send: config.notify.always_send,
            page_timeout: config.timing.page_timeout(),
            idle_timeout: config.timing.idle_timeout(),
            probe_delay: config.timing.probe_delay(),
            month_budget: config.timing.month_budget(),
            calendar_link: config.source.calendar_link.clone(),
        }
    }
}

/// Result of a single-date run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleOutcome {
    /// No price could be read; nothing was persisted
    Unreadable,
    /// First price seen for this date
    Initialized { price: Price },
    /// Compared against the previous run's price
    Compared {
        old: Price,
        new: Price,
        /// Whether the move passed the threshold policy
        reported: bool,
    },
}

/// Result of a month run
#[derive(Debug, Clone)]
pub struct MonthOutcome {
    /// The snapshot that was persisted
    pub snapshot: PriceSnapshot,
    /// Reportable changes, sorted by date
    pub changes: Vec<ChangeRecord>,
    /// Whether a digest was delivered
    pub digest_sent: bool,
    /// Whether the time budget cut the run short
    pub truncated: bool,
    pub commit: CommitOutcome,
}

/// Runs the fetch → extract → diff → report → persist pipeline
pub struct Watcher {
    route: RouteLabel,
    query: SearchQuery,
    components: Components,
    settings: WatchSettings,
}

impl Watcher {
    /// Create a watcher
    pub fn new(
        route: RouteLabel,
        query: SearchQuery,
        components: Components,
        settings: WatchSettings,
    ) -> Self {
        Self {
            route,
            query,
            components,
            settings,
        }
    }

    /// Create a watcher with production components
    pub fn from_config(config: &Config, flags: RunFlags) -> Self {
        let route = RouteLabel {
            carrier: config.source.carrier.clone(),
            origin: config.route.origin.clone(),
            destination: config.route.destination.clone(),
            currency: config.route.currency.clone(),
        };
        let query = SearchQuery::new(
            config.source.search_url.clone(),
            config.route.origin.clone(),
            config.route.destination.clone(),
            config.route.currency.clone(),
        );
        Self::new(
            route,
            query,
            Components::from_config(config, flags),
            WatchSettings::from_config(config),
        )
    }

    /// Probe one departure date
    ///
    /// Failures are logged and yield `None`.
    pub async fn probe(&self, date: NaiveDate) -> Option<Price> {
        let url = self.query.url_for(date);
        let started = Instant::now();
        let result = self
            .components
            .fetcher
            .render(&url, self.settings.page_timeout, self.settings.idle_timeout)
            .await;
        telemetry::record_latency(LatencyMetric::PageRender, started.elapsed());

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(%date, error = %e, "Probe failed");
                telemetry::increment(CounterMetric::ProbeFailed);
                return None;
            }
        };

        match self.components.extractor.extract(&page) {
            Some(price) => {
                tracing::info!(%date, price, "Price found");
                telemetry::increment(CounterMetric::ProbeSucceeded);
                Some(price)
            }
            None => {
                tracing::warn!(%date, page_bytes = page.len(), "No price found on page");
                telemetry::increment(CounterMetric::ProbeFailed);
                None
            }
        }
    }

    /// Watch a single departure date
    pub async fn run_single(&self, date: NaiveDate) -> anyhow::Result<SingleOutcome> {
        let key = SnapshotKey::day(&self.route.origin, &self.route.destination, date);
        let previous = self.components.store.load(&key).get(date);
        let url = self.query.url_for(date);
        tracing::info!(url = %url, previous, "Watching date");

        let price = self.probe(date).await;
        let timestamp = now_timestamp();

        let Some(price) = price else {
            self.deliver(&unreadable_message(&self.route, date, &timestamp, &url))
                .await;
            return Ok(SingleOutcome::Unreadable);
        };

        let outcome = match previous {
            None => {
                self.deliver(&initial_message(&self.route, date, price, &url))
                    .await;
                SingleOutcome::Initialized { price }
            }
            Some(old) => {
                let reported = self.settings.threshold.is_reportable(old, price);
                if reported {
                    let text = update_message(&self.route, date, old, price, &timestamp, &url);
                    self.deliver(&text).await;
                } else {
                    tracing::info!(old, new = price, "No reportable change");
                }
                SingleOutcome::Compared {
                    old,
                    new: price,
                    reported,
                }
            }
        };

        let mut snapshot = PriceSnapshot::new(timestamp);
        snapshot.insert(date, price);
        self.components.store.save(&key, &snapshot)?;

        let verb = if previous.is_none() { "init" } else { "update" };
        self.components
            .committer
            .commit_if_changed(&format!("state: {verb} {key}"))
            .await?;

        Ok(outcome)
    }

    /// Watch every departure date of a month
    pub async fn run_month(&self, year: i32, month: u32) -> anyhow::Result<MonthOutcome> {
        let key = SnapshotKey::month(&self.route.origin, &self.route.destination, year, month);
        let dates = key.dates();
        if dates.is_empty() {
            anyhow::bail!("invalid month {year}-{month:02}");
        }

        let previous = self.components.store.load(&key);
        tracing::info!(
            dates = dates.len(),
            previous_dates = previous.len(),
            "Watching month"
        );

        let started = Instant::now();
        let mut prices: Vec<(NaiveDate, Price)> = Vec::with_capacity(dates.len());
        let mut truncated = false;

        for (i, &date) in dates.iter().enumerate() {
            if let Some(price) = self.probe(date).await {
                prices.push((date, price));
            }

            let remaining = dates.len() - i - 1;
            if remaining == 0 {
                break;
            }
            if started.elapsed() >= self.settings.month_budget {
                tracing::warn!(
                    skipped = remaining,
                    budget_secs = self.settings.month_budget.as_secs(),
                    "Time budget exhausted, skipping remaining dates"
                );
                truncated = true;
                break;
            }
            if !self.settings.probe_delay.is_zero() {
                tokio::time::sleep(self.settings.probe_delay).await;
            }
        }

        let timestamp = now_timestamp();
        let mut snapshot = PriceSnapshot::new(timestamp.clone());
        for (date, price) in prices {
            snapshot.insert(date, price);
        }

        let changes = detect_changes(&previous, &snapshot, self.settings.threshold);
        telemetry::set_gauge(GaugeMetric::DatesPriced, snapshot.len() as f64);
        telemetry::set_gauge(GaugeMetric::ChangesDetected, changes.len() as f64);
        if let Some(min) = snapshot.min_price() {
            telemetry::set_gauge(GaugeMetric::MinPrice, min as f64);
        }
        tracing::info!(
            priced = snapshot.len(),
            changes = changes.len(),
            min_price = snapshot.min_price(),
            "Month probed"
        );

        let digest_sent = if should_send_digest(&changes, &snapshot, self.settings.always_send) {
            let digest = MonthDigest {
                route: &self.route,
                year,
                month,
                snapshot: &snapshot,
                changes: &changes,
                timestamp: &timestamp,
                calendar_link: self.settings.calendar_link.as_deref(),
            };
            self.deliver(&digest.render()).await
        } else {
            tracing::info!("Nothing to report");
            false
        };

        self.components.store.save(&key, &snapshot)?;
        let commit = self
            .components
            .committer
            .commit_if_changed(&format!("month state: {key}"))
            .await?;

        Ok(MonthOutcome {
            snapshot,
            changes,
            digest_sent,
            truncated,
            commit,
        })
    }

    /// Send a message; failures are logged, never propagated
    async fn deliver(&self, text: &str) -> bool {
        let started = Instant::now();
        let result = self.components.notifier.send(text).await;
        telemetry::record_latency(LatencyMetric::NotificationSend, started.elapsed());

        match result {
            Ok(()) => {
                tracing::info!("Notification sent");
                telemetry::increment(CounterMetric::NotificationSent);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send notification");
                telemetry::increment(CounterMetric::NotificationFailed);
                false
            }
        }
    }
}

fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{CommitError, DurableCommit};
    use crate::extract::RegexExtractor;
    use crate::fetch::{FetchError, PageFetcher};
    use crate::report::{NotifyError, Notifier};
    use crate::snapshot::{FileStore, SnapshotStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Serves canned pages keyed by departure date
    struct FakeFetcher {
        pages: HashMap<NaiveDate, String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn render(
            &self,
            url: &str,
            page_timeout: Duration,
            _idle_timeout: Duration,
        ) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .iter()
                .find(|(date, _)| url.contains(&format!("departureDate={date}")))
                .map(|(_, page)| page.clone())
                .ok_or(FetchError::Timeout(page_timeout))
        }
    }

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Api("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingCommitter {
        messages: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DurableCommit for RecordingCommitter {
        async fn commit_if_changed(&self, message: &str) -> Result<CommitOutcome, CommitError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(CommitOutcome::Committed)
        }
    }

    struct Harness {
        _dir: TempDir,
        store: FileStore,
        notifier: RecordingNotifier,
        committer: RecordingCommitter,
        calls: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = FileStore::new(dir.path().join("state"), "vietjet");
            Self {
                _dir: dir,
                store,
                notifier: RecordingNotifier::default(),
                committer: RecordingCommitter::default(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn watcher(&self, pages: &[(NaiveDate, &str)], settings: WatchSettings) -> Watcher {
            let route = RouteLabel {
                carrier: "VietJet".to_string(),
                origin: "HAN".to_string(),
                destination: "SGN".to_string(),
                currency: "VND".to_string(),
            };
            let query = SearchQuery::new("https://example.com/search", "HAN", "SGN", "VND");
            let components = Components {
                fetcher: Box::new(FakeFetcher {
                    pages: pages.iter().map(|(d, p)| (*d, p.to_string())).collect(),
                    calls: self.calls.clone(),
                }),
                extractor: Box::new(RegexExtractor::new()),
                store: Box::new(self.store.clone()),
                notifier: Box::new(self.notifier.clone()),
                committer: Box::new(self.committer.clone()),
            };
            Watcher::new(route, query, components, settings)
        }

        fn sent(&self) -> Vec<String> {
            self.notifier.sent.lock().unwrap().clone()
        }

        fn commits(&self) -> Vec<String> {
            self.committer.messages.lock().unwrap().clone()
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn fast() -> WatchSettings {
        WatchSettings {
            probe_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_initial_price() {
        let h = Harness::new();
        let watcher = h.watcher(&[(date(14), "<b>2.300.000 VND</b>")], fast());

        let outcome = watcher.run_single(date(14)).await.unwrap();
        assert_eq!(outcome, SingleOutcome::Initialized { price: 2_300_000 });

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("2.300.000 VND"));

        let key = SnapshotKey::day("HAN", "SGN", date(14));
        assert_eq!(h.store.load(&key).get(date(14)), Some(2_300_000));
        assert_eq!(h.commits(), vec!["state: init HAN-SGN-2026-02-14"]);
    }

    #[tokio::test]
    async fn test_single_update_drop() {
        let h = Harness::new();
        let key = SnapshotKey::day("HAN", "SGN", date(14));
        let mut prev = PriceSnapshot::new("earlier");
        prev.insert(date(14), 2_300_000);
        h.store.save(&key, &prev).unwrap();

        let watcher = h.watcher(&[(date(14), "2.100.000 VND")], fast());
        let outcome = watcher.run_single(date(14)).await.unwrap();
        assert_eq!(
            outcome,
            SingleOutcome::Compared {
                old: 2_300_000,
                new: 2_100_000,
                reported: true
            }
        );

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("⬇️"));
        assert!(sent[0].contains("200.000 VND"));
        assert_eq!(h.store.load(&key).get(date(14)), Some(2_100_000));
        assert_eq!(h.commits(), vec!["state: update HAN-SGN-2026-02-14"]);
    }

    #[tokio::test]
    async fn test_single_rise_suppressed_by_threshold() {
        let h = Harness::new();
        let key = SnapshotKey::day("HAN", "SGN", date(14));
        let mut prev = PriceSnapshot::new("earlier");
        prev.insert(date(14), 2_000_000);
        h.store.save(&key, &prev).unwrap();

        let settings = WatchSettings {
            threshold: DropThreshold(50_000),
            ..fast()
        };
        let watcher = h.watcher(&[(date(14), "2.100.000")], settings);
        let outcome = watcher.run_single(date(14)).await.unwrap();

        assert!(matches!(outcome, SingleOutcome::Compared { reported: false, .. }));
        assert!(h.sent().is_empty());
        // Still persisted
        assert_eq!(h.store.load(&key).get(date(14)), Some(2_100_000));
    }

    #[tokio::test]
    async fn test_single_unreadable() {
        let h = Harness::new();
        let watcher = h.watcher(&[(date(14), "no fares today")], fast());

        let outcome = watcher.run_single(date(14)).await.unwrap();
        assert_eq!(outcome, SingleOutcome::Unreadable);
        assert_eq!(h.sent().len(), 1);
        assert!(h.sent()[0].starts_with("⚠️"));
        assert!(h.commits().is_empty());

        let key = SnapshotKey::day("HAN", "SGN", date(14));
        assert!(!h.store.location(&key).exists());
    }

    #[tokio::test]
    async fn test_single_notifier_failure_not_fatal() {
        let mut h = Harness::new();
        h.notifier.fail = true;
        let watcher = h.watcher(&[(date(14), "2.300.000")], fast());

        let outcome = watcher.run_single(date(14)).await.unwrap();
        assert_eq!(outcome, SingleOutcome::Initialized { price: 2_300_000 });
        assert_eq!(h.commits().len(), 1);
    }

    #[tokio::test]
    async fn test_month_first_run_reports_all() {
        let h = Harness::new();
        let watcher = h.watcher(
            &[
                (date(1), "2.000.000"),
                (date(2), "1.500.000"),
                (date(3), "1.500.000"),
            ],
            fast(),
        );

        let outcome = watcher.run_month(2026, 2).await.unwrap();
        assert_eq!(h.calls.load(Ordering::SeqCst), 28);
        assert_eq!(outcome.snapshot.len(), 3);
        assert_eq!(outcome.changes.len(), 3);
        assert!(outcome.changes.iter().all(|c| c.is_new()));
        assert!(outcome.digest_sent);
        assert!(!outcome.truncated);

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("on days: 02, 03"));
        assert_eq!(h.commits(), vec!["month state: HAN-SGN 2026-02"]);
    }

    #[tokio::test]
    async fn test_month_unchanged_is_silent() {
        let h = Harness::new();
        let pages = [(date(1), "2.000.000"), (date(2), "1.500.000")];

        h.watcher(&pages, fast()).run_month(2026, 2).await.unwrap();
        assert_eq!(h.sent().len(), 1);

        let outcome = h.watcher(&pages, fast()).run_month(2026, 2).await.unwrap();
        assert!(outcome.changes.is_empty());
        assert!(!outcome.digest_sent);
        assert_eq!(h.sent().len(), 1);
        // Persisted and committed every run
        assert_eq!(h.commits().len(), 2);
    }

    #[tokio::test]
    async fn test_month_always_send_without_changes() {
        let h = Harness::new();
        let pages = [(date(1), "2.000.000")];
        h.watcher(&pages, fast()).run_month(2026, 2).await.unwrap();

        let settings = WatchSettings {
            always_send: true,
            ..fast()
        };
        let outcome = h.watcher(&pages, settings).run_month(2026, 2).await.unwrap();
        assert!(outcome.changes.is_empty());
        assert!(outcome.digest_sent);
        assert_eq!(h.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_month_always_send_with_no_prices_is_silent() {
        let h = Harness::new();
        let settings = WatchSettings {
            always_send: true,
            ..fast()
        };
        let outcome = h.watcher(&[], settings).run_month(2026, 2).await.unwrap();
        assert!(outcome.snapshot.is_empty());
        assert!(!outcome.digest_sent);
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn test_month_snapshot_replaces_previous() {
        let h = Harness::new();
        let key = SnapshotKey::month("HAN", "SGN", 2026, 2);
        let mut prev = PriceSnapshot::new("earlier");
        prev.insert(date(1), 2_000_000);
        prev.insert(date(5), 1_800_000);
        h.store.save(&key, &prev).unwrap();

        let outcome = h
            .watcher(&[(date(1), "1.900.000")], fast())
            .run_month(2026, 2)
            .await
            .unwrap();

        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].old, Some(2_000_000));
        let stored = h.store.load(&key);
        assert_eq!(stored.get(date(1)), Some(1_900_000));
        assert_eq!(stored.get(date(5)), None);
    }

    #[tokio::test]
    async fn test_month_budget_truncates_but_persists() {
        let h = Harness::new();
        let settings = WatchSettings {
            month_budget: Duration::ZERO,
            ..fast()
        };
        let outcome = h
            .watcher(&[(date(1), "2.000.000"), (date(2), "1.500.000")], settings)
            .run_month(2026, 2)
            .await
            .unwrap();

        assert!(outcome.truncated);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.snapshot.get(date(1)), Some(2_000_000));
        assert!(outcome.digest_sent);

        let key = SnapshotKey::month("HAN", "SGN", 2026, 2);
        assert_eq!(h.store.load(&key).len(), 1);
    }

    #[tokio::test]
    async fn test_month_invalid_month() {
        let h = Harness::new();
        assert!(h.watcher(&[], fast()).run_month(2026, 13).await.is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.notify.price_drop_threshold = 100_000;
        config.timing.probe_delay_ms = 250;
        let settings = WatchSettings::from_config(&config);
        assert_eq!(settings.threshold, DropThreshold(100_000));
        assert_eq!(settings.probe_delay, Duration::from_millis(250));
        assert_eq!(settings.page_timeout, Duration::from_secs(120));
    }
}

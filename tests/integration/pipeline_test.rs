//! End-to-end watch runs over in-memory collaborators

use async_trait::async_trait;
use chrono::NaiveDate;
use fare_watch::commit::{CommitError, CommitOutcome, DurableCommit};
use fare_watch::detect::DropThreshold;
use fare_watch::extract::RegexExtractor;
use fare_watch::fetch::{FetchError, PageFetcher, SearchQuery};
use fare_watch::report::{NotifyError, Notifier, RouteLabel};
use fare_watch::snapshot::{FileStore, SnapshotKey, SnapshotStore};
use fare_watch::watch::{Components, SingleOutcome, WatchSettings, Watcher};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Returns whatever page is currently loaded, for any URL
#[derive(Clone, Default)]
struct ScriptedFetcher {
    page: Arc<Mutex<Option<String>>>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    fn serve(&self, page: Option<&str>) {
        *self.page.lock().unwrap() = page.map(str::to_string);
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn render(
        &self,
        url: &str,
        page_timeout: Duration,
        _idle_timeout: Duration,
    ) -> Result<String, FetchError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.page
            .lock()
            .unwrap()
            .clone()
            .ok_or(FetchError::Timeout(page_timeout))
    }
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl Notifier for Inbox {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CommitLog(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl DurableCommit for CommitLog {
    async fn commit_if_changed(&self, message: &str) -> Result<CommitOutcome, CommitError> {
        self.0.lock().unwrap().push(message.to_string());
        Ok(CommitOutcome::Committed)
    }
}

struct Setup {
    dir: TempDir,
    fetcher: ScriptedFetcher,
    inbox: Inbox,
    commits: CommitLog,
}

impl Setup {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            fetcher: ScriptedFetcher::default(),
            inbox: Inbox::default(),
            commits: CommitLog::default(),
        }
    }

    fn store(&self) -> FileStore {
        FileStore::new(self.dir.path().join("state"), "vietjet")
    }

    fn watcher(&self, settings: WatchSettings) -> Watcher {
        let route = RouteLabel {
            carrier: "VietJet".to_string(),
            origin: "HAN".to_string(),
            destination: "SGN".to_string(),
            currency: "VND".to_string(),
        };
        let query = SearchQuery::new("https://www.vietjetair.com/vi/search", "HAN", "SGN", "VND");
        let components = Components {
            fetcher: Box::new(self.fetcher.clone()),
            extractor: Box::new(RegexExtractor::new()),
            store: Box::new(self.store()),
            notifier: Box::new(self.inbox.clone()),
            committer: Box::new(self.commits.clone()),
        };
        Watcher::new(route, query, components, settings)
    }

    fn messages(&self) -> Vec<String> {
        self.inbox.0.lock().unwrap().clone()
    }
}

fn quick() -> WatchSettings {
    WatchSettings {
        probe_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn feb14() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
}

#[tokio::test]
async fn test_single_date_lifecycle() {
    let setup = Setup::new();

    setup.fetcher.serve(Some("Giá từ <b>2.300.000</b> VND, phí 45.000"));
    let first = setup.watcher(quick()).run_single(feb14()).await.unwrap();
    assert_eq!(first, SingleOutcome::Initialized { price: 2_300_000 });

    setup.fetcher.serve(Some("Giá từ <b>2.100.000</b> VND"));
    let second = setup.watcher(quick()).run_single(feb14()).await.unwrap();
    assert_eq!(
        second,
        SingleOutcome::Compared {
            old: 2_300_000,
            new: 2_100_000,
            reported: true
        }
    );

    setup.fetcher.serve(None);
    let third = setup.watcher(quick()).run_single(feb14()).await.unwrap();
    assert_eq!(third, SingleOutcome::Unreadable);

    let messages = setup.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("2.300.000 VND"));
    assert!(messages[1].contains("⬇️"));
    assert!(messages[1].contains("-200.000 VND"));
    assert!(messages[2].starts_with("⚠️"));

    // The unreadable run left the last good price in place
    let key = SnapshotKey::day("HAN", "SGN", feb14());
    assert_eq!(setup.store().load(&key).get(feb14()), Some(2_100_000));

    let commits = setup.commits.0.lock().unwrap().clone();
    assert_eq!(
        commits,
        vec![
            "state: init HAN-SGN-2026-02-14",
            "state: update HAN-SGN-2026-02-14"
        ]
    );

    let urls = setup.fetcher.urls.lock().unwrap().clone();
    assert!(urls[0].contains("departureDate=2026-02-14"));
    assert!(urls[0].contains("tripType=1"));
}

#[tokio::test]
async fn test_month_run_and_rerun() {
    let setup = Setup::new();

    setup.fetcher.serve(Some("1.500.000"));
    let first = setup.watcher(quick()).run_month(2026, 2).await.unwrap();
    assert_eq!(first.snapshot.len(), 28);
    assert_eq!(first.changes.len(), 28);
    assert!(first.digest_sent);
    assert_eq!(setup.fetcher.urls.lock().unwrap().len(), 28);

    let digest = &setup.messages()[0];
    assert!(digest.contains("02/2026"));
    assert!(digest.contains("1.500.000 VND"));
    // Only the first ten changes are listed
    assert_eq!(digest.matches("+ New day").count(), 10);

    let second = setup.watcher(quick()).run_month(2026, 2).await.unwrap();
    assert!(second.changes.is_empty());
    assert!(!second.digest_sent);
    assert_eq!(setup.messages().len(), 1);
}

#[tokio::test]
async fn test_month_threshold_policy() {
    let setup = Setup::new();
    setup.fetcher.serve(Some("2.000.000"));
    setup.watcher(quick()).run_month(2026, 2).await.unwrap();

    let settings = WatchSettings {
        threshold: DropThreshold(50_000),
        ..quick()
    };

    // A drop smaller than the threshold is ignored
    setup.fetcher.serve(Some("1.980.000"));
    let small = setup.watcher(settings.clone()).run_month(2026, 2).await.unwrap();
    assert!(small.changes.is_empty());

    // Rises are never reported under a nonzero threshold
    setup.fetcher.serve(Some("2.500.000"));
    let rise = setup.watcher(settings.clone()).run_month(2026, 2).await.unwrap();
    assert!(rise.changes.is_empty());
    assert!(!rise.digest_sent);

    // A large enough drop is
    setup.fetcher.serve(Some("2.400.000"));
    let drop = setup.watcher(settings).run_month(2026, 2).await.unwrap();
    assert_eq!(drop.changes.len(), 28);
    assert!(drop.digest_sent);
    assert_eq!(setup.messages().len(), 2);
}

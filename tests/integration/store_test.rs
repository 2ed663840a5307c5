//! Snapshot store tests against the on-disk layout

use chrono::NaiveDate;
use fare_watch::snapshot::{FileStore, PriceSnapshot, SnapshotKey, SnapshotStore};
use tempfile::TempDir;

fn feb(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

#[test]
fn test_day_and_month_files_are_separate() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path(), "vietjet");

    let day_key = SnapshotKey::day("HAN", "SGN", feb(14));
    let month_key = SnapshotKey::month("HAN", "SGN", 2026, 2);

    let mut day = PriceSnapshot::new("2026-01-01 00:00:00 UTC");
    day.insert(feb(14), 2_300_000);
    let mut month = PriceSnapshot::new("2026-01-01 00:00:00 UTC");
    month.insert(feb(1), 1_500_000);
    month.insert(feb(2), 1_700_000);

    let day_path = store.save(&day_key, &day).unwrap();
    let month_path = store.save(&month_key, &month).unwrap();

    assert_eq!(
        day_path.file_name().unwrap(),
        "vietjet_HAN_SGN_2026-02-14.json"
    );
    assert_eq!(
        month_path.file_name().unwrap(),
        "vietjet_month_HAN_SGN_2026-02.json"
    );
    assert_eq!(store.load(&day_key), day);
    assert_eq!(store.load(&month_key), month);
}

#[test]
fn test_routes_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path(), "vietjet");

    let han = SnapshotKey::day("HAN", "SGN", feb(14));
    let dad = SnapshotKey::day("HAN", "DAD", feb(14));

    let mut snapshot = PriceSnapshot::new("t");
    snapshot.insert(feb(14), 900_000);
    store.save(&dad, &snapshot).unwrap();

    assert!(store.load(&han).is_empty());
    assert_eq!(store.load(&dad).get(feb(14)), Some(900_000));
}

#[test]
fn test_existing_month_file_loads() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path(), "vietjet");
    let key = SnapshotKey::month("HAN", "SGN", 2026, 2);

    std::fs::write(
        store.location(&key),
        r#"{"prices":{"2026-02-01":1500000,"2026-02-02":1700000},"last_update":"2026-01-31 23:00:00 UTC"}"#,
    )
    .unwrap();

    let snapshot = store.load(&key);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.min_price(), Some(1_500_000));
    assert_eq!(
        snapshot.last_update.as_deref(),
        Some("2026-01-31 23:00:00 UTC")
    );
}

#[test]
fn test_corrupt_file_degrades_to_empty() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path(), "vietjet");
    let key = SnapshotKey::month("HAN", "SGN", 2026, 2);

    std::fs::write(store.location(&key), "{not json").unwrap();
    assert!(store.load(&key).is_empty());
}

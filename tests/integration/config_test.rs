//! Configuration loading tests

use fare_watch::config::{Config, FetcherKind};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_example_loads() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.route.origin, "HAN");
    assert_eq!(config.route.destination, "SGN");
    assert_eq!(config.source.fetcher, FetcherKind::Chrome);
    assert_eq!(config.store.file_prefix, "vietjet");
    assert!(!config.commit.enabled);
    config.validate().unwrap();
}

#[test]
fn test_config_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [route]
        origin = "SGN"
        destination = "PQC"
        year = 2026
        month = 3

        [notify]
        always_send = true
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.target_month().unwrap(), (2026, 3));
    assert!(config.notify.always_send);
    assert!(config.target_date().is_err());
}

#[test]
fn test_env_overrides_file() {
    let mut config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    config
        .apply_env_from(|var| match var {
            "DEST" => Some("DAD".to_string()),
            "DATE" => Some("2026-02-14".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.route.destination, "DAD");
    assert_eq!(config.target_date().unwrap().to_string(), "2026-02-14");
}

#[test]
fn test_invalid_toml_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[route\norigin = ").unwrap();
    assert!(Config::load(file.path()).is_err());
}

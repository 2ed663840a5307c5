//! JSON file snapshot store
//!
//! Day files hold `{"price": N, "last_update": ...}` and month files hold
//! `{"prices": {"YYYY-MM-DD": N}, "last_update": ...}`. Either shape loads
//! for either key.

use super::{PriceSnapshot, SnapshotKey, SnapshotStore, StoreError};
use crate::Price;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// On-disk snapshot shapes
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Month {
        prices: BTreeMap<NaiveDate, Price>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_update: Option<String>,
    },
    Day {
        price: Price,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_update: Option<String>,
    },
}

/// Stores one JSON file per snapshot key in a state directory
#[derive(Debug, Clone)]
pub struct FileStore {
    state_dir: PathBuf,
    prefix: String,
}

impl FileStore {
    /// Create a store rooted at `state_dir`
    pub fn new(state_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            state_dir: state_dir.into(),
            prefix: prefix.into(),
        }
    }

    fn decode(key: &SnapshotKey, content: &str) -> serde_json::Result<PriceSnapshot> {
        let stored: StoredSnapshot = serde_json::from_str(content)?;
        let snapshot = match stored {
            StoredSnapshot::Month {
                prices,
                last_update,
            } => PriceSnapshot {
                prices,
                last_update,
            },
            StoredSnapshot::Day { price, last_update } => {
                let mut prices = BTreeMap::new();
                if let SnapshotKey::Day { date, .. } = key {
                    prices.insert(*date, price);
                }
                PriceSnapshot {
                    prices,
                    last_update,
                }
            }
        };
        Ok(snapshot)
    }

    fn encode(key: &SnapshotKey, snapshot: &PriceSnapshot) -> serde_json::Result<String> {
        let stored = match key {
            SnapshotKey::Day { date, .. } => match snapshot.get(*date) {
                Some(price) => StoredSnapshot::Day {
                    price,
                    last_update: snapshot.last_update.clone(),
                },
                None => StoredSnapshot::Month {
                    prices: snapshot.prices.clone(),
                    last_update: snapshot.last_update.clone(),
                },
            },
            SnapshotKey::Month { .. } => StoredSnapshot::Month {
                prices: snapshot.prices.clone(),
                last_update: snapshot.last_update.clone(),
            },
        };
        serde_json::to_string_pretty(&stored)
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, key: &SnapshotKey) -> PriceSnapshot {
        let path = self.location(key);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "No previous snapshot");
                return PriceSnapshot::default();
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to read snapshot, starting empty");
                return PriceSnapshot::default();
            }
        };

        match Self::decode(key, &content) {
            Ok(mut snapshot) => {
                let before = snapshot.len();
                snapshot.prices.retain(|date, _| key.covers(*date));
                if snapshot.len() < before {
                    tracing::warn!(
                        path = ?path,
                        dropped = before - snapshot.len(),
                        "Ignoring dates outside the snapshot period"
                    );
                }
                tracing::debug!(path = ?path, dates = snapshot.len(), "Loaded snapshot");
                snapshot
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Corrupt snapshot, starting empty");
                PriceSnapshot::default()
            }
        }
    }

    fn save(&self, key: &SnapshotKey, snapshot: &PriceSnapshot) -> Result<PathBuf, StoreError> {
        let path = self.location(key);
        let content = Self::encode(key, snapshot)?;

        std::fs::create_dir_all(&self.state_dir).map_err(|source| StoreError::Io {
            path: self.state_dir.clone(),
            source,
        })?;
        std::fs::write(&path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = ?path, dates = snapshot.len(), "Saved snapshot");
        Ok(path)
    }

    fn location(&self, key: &SnapshotKey) -> PathBuf {
        self.state_dir
            .join(format!("{}.json", key.file_stem(&self.prefix)))
    }
}

//! Snapshot persistence
//!
//! A snapshot is the date → cheapest price mapping of the latest run for one
//! route and period. Each run replaces it wholesale.

mod file;

pub use file::FileStore;

use crate::Price;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Timestamp format stored in `last_update`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Prices observed by one run, ordered by date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Cheapest price per departure date
    pub prices: BTreeMap<NaiveDate, Price>,
    /// When the snapshot was taken
    pub last_update: Option<String>,
}

impl PriceSnapshot {
    /// Create an empty snapshot stamped with `last_update`
    pub fn new(last_update: impl Into<String>) -> Self {
        Self {
            prices: BTreeMap::new(),
            last_update: Some(last_update.into()),
        }
    }

    /// Record the price for a date, replacing any earlier value
    pub fn insert(&mut self, date: NaiveDate, price: Price) {
        self.prices.insert(date, price);
    }

    /// Price for a date
    pub fn get(&self, date: NaiveDate) -> Option<Price> {
        self.prices.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Iterate (date, price) in date order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Price)> + '_ {
        self.prices.iter().map(|(d, p)| (*d, *p))
    }

    /// Lowest price in the snapshot
    pub fn min_price(&self) -> Option<Price> {
        self.prices.values().copied().min()
    }
}

/// Identifies one route/period snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    /// A single departure date
    Day {
        origin: String,
        destination: String,
        date: NaiveDate,
    },
    /// Every departure date of a calendar month
    Month {
        origin: String,
        destination: String,
        year: i32,
        month: u32,
    },
}

impl SnapshotKey {
    /// Key for a single departure date
    pub fn day(origin: &str, destination: &str, date: NaiveDate) -> Self {
        Self::Day {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date,
        }
    }

    /// Key for a calendar month
    pub fn month(origin: &str, destination: &str, year: i32, month: u32) -> Self {
        Self::Month {
            origin: origin.to_string(),
            destination: destination.to_string(),
            year,
            month,
        }
    }

    /// File stem under the state directory
    pub fn file_stem(&self, prefix: &str) -> String {
        match self {
            Self::Day {
                origin,
                destination,
                date,
            } => format!("{prefix}_{origin}_{destination}_{}", date.format("%Y-%m-%d")),
            Self::Month {
                origin,
                destination,
                year,
                month,
            } => format!("{prefix}_month_{origin}_{destination}_{year}-{month:02}"),
        }
    }

    /// Every departure date covered by this key
    ///
    /// Empty for an invalid month.
    pub fn dates(&self) -> Vec<NaiveDate> {
        match self {
            Self::Day { date, .. } => vec![*date],
            Self::Month { year, month, .. } => days_of_month(*year, *month),
        }
    }

    /// Whether a date falls inside this key's period
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self {
            Self::Day { date: d, .. } => *d == date,
            Self::Month { year, month, .. } => date.year() == *year && date.month() == *month,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day {
                origin,
                destination,
                date,
            } => write!(f, "{origin}-{destination}-{}", date.format("%Y-%m-%d")),
            Self::Month {
                origin,
                destination,
                year,
                month,
            } => write!(f, "{origin}-{destination} {year}-{month:02}"),
        }
    }
}

/// All dates of a calendar month, in order
pub fn days_of_month(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// Snapshot store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error while writing
    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serialization error
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Trait for snapshot storage backends
pub trait SnapshotStore: Send + Sync {
    /// Load the previous snapshot, or an empty one if it cannot be read
    fn load(&self, key: &SnapshotKey) -> PriceSnapshot;
    /// Replace the stored snapshot for `key`
    fn save(&self, key: &SnapshotKey, snapshot: &PriceSnapshot) -> Result<PathBuf, StoreError>;
    /// Where the snapshot for `key` lives
    fn location(&self, key: &SnapshotKey) -> PathBuf;
}

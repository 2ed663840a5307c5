//! Change detection
//!
//! Compares a fresh snapshot against the previous one. A first sighting is
//! always reported. With a zero threshold any difference is reported; with a
//! nonzero threshold only drops of at least that size are, and rises are
//! never reported.

use crate::snapshot::PriceSnapshot;
use crate::Price;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Direction of a price move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    /// Glyph used in notifications
    pub fn glyph(&self) -> &'static str {
        match self {
            Direction::Down => "⬇️",
            Direction::Up => "⬆️",
        }
    }
}

/// A reportable price observation for one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Departure date
    pub date: NaiveDate,
    /// Previous price, `None` when first observed
    pub old: Option<Price>,
    /// Current price
    pub new: Price,
}

impl ChangeRecord {
    /// Whether this date had no previous price
    pub fn is_new(&self) -> bool {
        self.old.is_none()
    }

    /// Signed change `new - old`, saturating at the `i64` range
    pub fn delta(&self) -> Option<i64> {
        self.old.map(|old| signed_delta(old, self.new))
    }

    /// Direction of the move, `None` when first observed or unchanged
    pub fn direction(&self) -> Option<Direction> {
        match self.new.cmp(&self.old?) {
            Ordering::Less => Some(Direction::Down),
            Ordering::Greater => Some(Direction::Up),
            Ordering::Equal => None,
        }
    }
}

/// Minimum drop that triggers a notification; zero means any change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropThreshold(pub Price);

impl DropThreshold {
    /// Whether a move from `old` to `new` is worth reporting
    pub fn is_reportable(&self, old: Price, new: Price) -> bool {
        if new == old {
            return false;
        }
        if self.0 == 0 {
            return true;
        }
        new < old && old - new >= self.0
    }
}

/// Changes between `prev` and `new`, sorted by date
///
/// Dates present only in `prev` are not reported.
pub fn detect_changes(
    prev: &PriceSnapshot,
    new: &PriceSnapshot,
    threshold: DropThreshold,
) -> Vec<ChangeRecord> {
    new.iter()
        .filter_map(|(date, price)| match prev.get(date) {
            None => Some(ChangeRecord {
                date,
                old: None,
                new: price,
            }),
            Some(old) if threshold.is_reportable(old, price) => Some(ChangeRecord {
                date,
                old: Some(old),
                new: price,
            }),
            Some(_) => None,
        })
        .collect()
}

fn signed_delta(old: Price, new: Price) -> i64 {
    if new >= old {
        i64::try_from(new - old).unwrap_or(i64::MAX)
    } else {
        i64::try_from(old - new).map(|d| -d).unwrap_or(i64::MIN)
    }
}

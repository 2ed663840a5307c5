//! Price extraction
//!
//! Turns rendered page text into the cheapest plausible fare on the page.

mod heuristic;

pub use heuristic::{RegexExtractor, PRICE_FLOOR, PRICE_PATTERN};

use crate::Price;

/// Trait for price extraction strategies
///
/// Implementations must return the minimum plausible price on the page so
/// that snapshots stay comparable across strategies.
pub trait PriceExtractor: Send + Sync {
    /// Extract the minimum price from rendered page text
    fn extract(&self, page: &str) -> Option<Price>;
}

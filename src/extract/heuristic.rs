//! Whole-page digit scan
//!
//! The search results markup has no stable selectors for fares, so this
//! scans every number on the page and relies on magnitude to reject dates,
//! ids and counters. It can be fooled by large non-price numbers (phone
//! numbers, booking references) and misses fares quoted below the floor.

use super::PriceExtractor;
use crate::Price;
use regex::Regex;

/// Smallest value accepted as a fare
pub const PRICE_FLOOR: Price = 100_000;

/// Grouped thousands (`1.234.000`, `1,234,000`) or a bare run of 5-10 digits
pub const PRICE_PATTERN: &str = r"(\d{1,3}(?:[.,]\d{3})+|\d{5,10})";

/// Regex scan over the full rendered text
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
    floor: Price,
}

impl RegexExtractor {
    /// Create an extractor with the default floor
    pub fn new() -> Self {
        Self::with_floor(PRICE_FLOOR)
    }

    /// Create an extractor with a custom floor
    pub fn with_floor(floor: Price) -> Self {
        let pattern = Regex::new(PRICE_PATTERN).expect("price pattern is a valid regex");
        Self { pattern, floor }
    }

    /// Floor below which candidates are discarded
    pub fn floor(&self) -> Price {
        self.floor
    }

    /// All candidates at or above the floor, in page order
    pub fn candidates(&self, page: &str) -> Vec<Price> {
        self.pattern
            .find_iter(page)
            .filter_map(|m| digits_only(m.as_str()).parse::<Price>().ok())
            .filter(|&value| value >= self.floor)
            .collect()
    }
}

impl Default for RegexExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceExtractor for RegexExtractor {
    fn extract(&self, page: &str) -> Option<Price> {
        self.candidates(page).into_iter().min()
    }
}

fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

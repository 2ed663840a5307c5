//! Search URL construction

use chrono::NaiveDate;
use reqwest::Url;

/// One-way, one-adult fare search for a route
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Search page URL without query string
    pub base_url: String,
    /// Origin airport code
    pub origin: String,
    /// Destination airport code
    pub destination: String,
    /// Currency code
    pub currency: String,
}

impl SearchQuery {
    /// Create a search query for a route
    pub fn new(
        base_url: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            origin: origin.into(),
            destination: destination.into(),
            currency: currency.into(),
        }
    }

    /// Build the search URL for a departure date
    pub fn url_for(&self, date: NaiveDate) -> String {
        let departure = date.format("%Y-%m-%d").to_string();
        let params = [
            ("tripType", "1"),
            ("origin", self.origin.as_str()),
            ("destination", self.destination.as_str()),
            ("departureDate", departure.as_str()),
            ("adult", "1"),
            ("child", "0"),
            ("infant", "0"),
            ("currency", self.currency.as_str()),
        ];

        match Url::parse_with_params(&self.base_url, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                // Fall back to plain concatenation; the fetch will report the bad URL
                tracing::warn!(base_url = %self.base_url, error = %e, "Invalid search base URL");
                let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{}?{}", self.base_url, query.join("&"))
            }
        }
    }
}

//! Message formatting
//!
//! Messages use Telegram's HTML parse mode. Amounts are grouped with `.`
//! and suffixed with the currency code, e.g. `2.300.000 VND`.

use crate::detect::ChangeRecord;
use crate::snapshot::PriceSnapshot;
use crate::Price;
use chrono::NaiveDate;

/// Changes listed in a month digest
pub const MAX_CHANGE_LINES: usize = 10;

/// Rows in the cheapest-days table
pub const TOP_DAYS: usize = 10;

/// Route identity shown in message headers
#[derive(Debug, Clone)]
pub struct RouteLabel {
    /// Airline name
    pub carrier: String,
    /// Origin airport code
    pub origin: String,
    /// Destination airport code
    pub destination: String,
    /// Currency code appended to amounts
    pub currency: String,
}

impl RouteLabel {
    fn path(&self) -> String {
        format!("{}→{}", self.origin, self.destination)
    }

    fn money(&self, price: Price) -> String {
        format_price(price, &self.currency)
    }

    fn carrier(&self) -> String {
        escape_html(&self.carrier)
    }
}

/// Escape text for Telegram's HTML parse mode
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Format an amount with `.` thousands grouping and a currency suffix
pub fn format_price(price: Price, currency: &str) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{grouped} {currency}")
}

/// Format a signed difference, e.g. `-200.000 VND` or `+150.000 VND`
pub fn format_signed(delta: i64, currency: &str) -> String {
    let sign = match delta.signum() {
        -1 => "-",
        1 => "+",
        _ => "",
    };
    format!("{sign}{}", format_price(delta.unsigned_abs(), currency))
}

/// Warning sent when no price could be read for a single date
pub fn unreadable_message(route: &RouteLabel, date: NaiveDate, timestamp: &str, url: &str) -> String {
    format!(
        "⚠️ Could not read {} fare {} {}. ({timestamp})\n{}",
        route.carrier(),
        route.path(),
        date.format("%Y-%m-%d"),
        escape_html(url),
    )
}

/// First observation of a single-date price
pub fn initial_message(route: &RouteLabel, date: NaiveDate, price: Price, url: &str) -> String {
    format!(
        "🛩️ {} {} ({})\nCurrent fare: <b>{}</b>\n{}",
        route.carrier(),
        route.path(),
        date.format("%Y-%m-%d"),
        route.money(price),
        escape_html(url),
    )
}

/// Single-date price change
pub fn update_message(
    route: &RouteLabel,
    date: NaiveDate,
    old: Price,
    new: Price,
    timestamp: &str,
    url: &str,
) -> String {
    let change = ChangeRecord {
        date,
        old: Some(old),
        new,
    };
    let glyph = change.direction().map(|d| d.glyph()).unwrap_or_default();
    let delta = change.delta().unwrap_or_default();

    format!(
        "🛎️ {} update {} ({}) {glyph}\nOld: {}\nNew: <b>{}</b>\nChange: {}\n({timestamp})\n{}",
        route.carrier(),
        route.path(),
        date.format("%Y-%m-%d"),
        route.money(old),
        route.money(new),
        format_signed(delta, &route.currency),
        escape_html(url),
    )
}

/// Cheapest price of a month and the dates that reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    pub min_price: Price,
    /// Sorted ascending
    pub cheapest_days: Vec<NaiveDate>,
}

impl MonthSummary {
    /// Summarize a snapshot, `None` when it is empty
    pub fn from_snapshot(snapshot: &PriceSnapshot) -> Option<Self> {
        let min_price = snapshot.min_price()?;
        let cheapest_days = snapshot
            .iter()
            .filter(|&(_, price)| price == min_price)
            .map(|(date, _)| date)
            .collect();
        Some(Self {
            min_price,
            cheapest_days,
        })
    }

    /// Two-digit day numbers of the cheapest dates
    pub fn day_labels(&self) -> Vec<String> {
        self.cheapest_days
            .iter()
            .map(|d| d.format("%d").to_string())
            .collect()
    }
}

/// Up to `n` entries ordered by (price, date)
pub fn top_cheapest(snapshot: &PriceSnapshot, n: usize) -> Vec<(NaiveDate, Price)> {
    let mut entries: Vec<(NaiveDate, Price)> = snapshot.iter().collect();
    entries.sort_by_key(|&(date, price)| (price, date));
    entries.truncate(n);
    entries
}

/// Whether a month digest should go out
///
/// Nothing is sent for an empty probe result, even when forced.
pub fn should_send_digest(
    changes: &[ChangeRecord],
    snapshot: &PriceSnapshot,
    always_send: bool,
) -> bool {
    (!changes.is_empty() || always_send) && !snapshot.is_empty()
}

/// Month digest message
pub struct MonthDigest<'a> {
    pub route: &'a RouteLabel,
    pub year: i32,
    pub month: u32,
    pub snapshot: &'a PriceSnapshot,
    /// Sorted by date
    pub changes: &'a [ChangeRecord],
    pub timestamp: &'a str,
    pub calendar_link: Option<&'a str>,
}

impl MonthDigest<'_> {
    /// Render the digest text
    pub fn render(&self) -> String {
        let route = self.route;
        let mut parts = vec![
            format!(
                "🗓️ {} {} {:02}/{}",
                route.carrier(),
                route.path(),
                self.month,
                self.year
            ),
            format!("🕒 {}", self.timestamp),
        ];

        if let Some(summary) = MonthSummary::from_snapshot(self.snapshot) {
            parts.push(format!(
                "💰 Cheapest: <b>{}</b> on days: {}",
                route.money(summary.min_price),
                summary.day_labels().join(", ")
            ));
        }

        if !self.changes.is_empty() {
            let lines: Vec<String> = self
                .changes
                .iter()
                .take(MAX_CHANGE_LINES)
                .map(|c| self.change_line(c))
                .collect();
            parts.push(format!("🔁 Changes since last run:\n{}", lines.join("\n")));
        }

        let top: Vec<String> = top_cheapest(self.snapshot, TOP_DAYS)
            .into_iter()
            .enumerate()
            .map(|(i, (date, price))| {
                format!("{}. Day {}: {}", i + 1, date.format("%d"), route.money(price))
            })
            .collect();
        parts.push(format!("🔟 Top {TOP_DAYS} cheapest days:\n{}", top.join("\n")));

        if let Some(link) = self.calendar_link {
            parts.push(format!("📎 Monthly fare calendar: {}", escape_html(link)));
        }

        parts.join("\n")
    }

    fn change_line(&self, change: &ChangeRecord) -> String {
        let day = change.date.format("%d");
        match change.old {
            None => format!("+ New day {day}: {}", self.route.money(change.new)),
            Some(old) => {
                let glyph = change.direction().map(|d| d.glyph()).unwrap_or_default();
                format!(
                    "• Day {day}: {} → <b>{}</b> {glyph}",
                    self.route.money(old),
                    self.route.money(change.new)
                )
            }
        }
    }
}

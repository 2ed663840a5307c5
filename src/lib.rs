//! fare-watch: airfare watcher for a single airline route
//!
//! This library provides the pieces of one watch run:
//! - Rendering the airline's search page (headless Chromium or plain HTTP)
//! - Heuristic price extraction from rendered text
//! - Snapshot persistence keyed by route and date/month
//! - Change detection under a drop-threshold policy
//! - Message formatting and Telegram delivery
//! - Durable commit of the snapshot through git
//! - Single-date and whole-month run orchestration

pub mod cli;
pub mod commit;
pub mod config;
pub mod detect;
pub mod extract;
pub mod fetch;
pub mod report;
pub mod snapshot;
pub mod telemetry;
pub mod watch;

/// A scraped fare, in the currency unit shown on the page
pub type Price = u64;

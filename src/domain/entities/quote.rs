//! Latest-quote record.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A point-in-time quote for one symbol. Ephemeral: never cached between
/// calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub ask_price: f64,
    pub bid_price: f64,
    pub ask_size: u64,
    pub bid_size: u64,
    /// Venue timestamp, when present.
    pub timestamp: Option<DateTime<Utc>>,
}

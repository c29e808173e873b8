//! Open-position record.

use serde::Serialize;

/// An open position, derived entirely from the remote position record.
/// `unrealized_plpc` is a percentage (remote fraction scaled by 100).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub qty: f64,
    pub avg_entry_price: f64,
    pub current_price: Option<f64>,
    pub market_value: f64,
    pub unrealized_pl: f64,
    pub unrealized_plpc: f64,
    pub asset_class: String,
    pub exchange: String,
}

//! Broker Client Trait
//!
//! Common interface to the remote brokerage boundary. The gateway operates
//! against this trait only, which keeps it independent of the concrete REST
//! implementation and lets tests substitute a mock broker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Common result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Failures at the remote boundary, before normalization.
#[derive(Debug, Error, Clone)]
pub enum BrokerError {
    /// The broker itself rejected the request with a structured error.
    #[error("{message} (Code: {code})")]
    Api {
        code: i64,
        message: String,
        /// Response body, verbatim.
        body: String,
    },

    /// Connectivity, serialization, or any other non-domain failure.
    #[error("{0}")]
    Transport(String),
}

/// Account snapshot as returned by the broker. Monetary fields arrive as
/// decimal strings and are parsed during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerAccount {
    pub account_number: String,
    pub status: String,
    pub equity: String,
    pub buying_power: String,
    pub cash: String,
    pub portfolio_value: String,
    #[serde(default)]
    pub daytrade_count: i64,
    pub currency: String,
}

/// Latest quote for one symbol, in the venue's abbreviated field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerQuote {
    #[serde(rename = "ap")]
    pub ask_price: f64,
    #[serde(rename = "bp")]
    pub bid_price: f64,
    #[serde(rename = "as", default)]
    pub ask_size: u64,
    #[serde(rename = "bs", default)]
    pub bid_size: u64,
    #[serde(rename = "t", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Open position as returned by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: String,
    pub qty: String,
    pub avg_entry_price: String,
    #[serde(default)]
    pub current_price: Option<String>,
    pub market_value: String,
    pub unrealized_pl: String,
    /// Fraction, not percentage: 0.05 means +5%.
    pub unrealized_plpc: String,
    pub asset_class: String,
    pub exchange: String,
}

/// Order acknowledgement as returned by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerOrder {
    pub id: String,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub qty: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit_price: Option<String>,
    #[serde(default)]
    pub stop_price: Option<String>,
}

/// Outbound order payload: canonical fields only, symbol already
/// upper-cased by the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerOrderRequest {
    pub symbol: String,
    pub qty: f64,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

/// Broker client trait providing the remote brokerage boundary.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Fetch the account snapshot.
    async fn fetch_account(&self) -> BrokerResult<BrokerAccount>;

    /// Fetch the latest quotes for the given symbols. The response may
    /// cover a subset of the request; missing symbols are simply absent.
    async fn fetch_latest_quotes(
        &self,
        symbols: &[String],
    ) -> BrokerResult<HashMap<String, BrokerQuote>>;

    /// Fetch all open positions.
    async fn fetch_open_positions(&self) -> BrokerResult<Vec<BrokerPosition>>;

    /// Submit an order and return the broker's acknowledgement.
    async fn submit_order(&self, order: &BrokerOrderRequest) -> BrokerResult<BrokerOrder>;
}

//! Response normalization.
//!
//! Maps raw broker records into the gateway's canonical entities and maps
//! every remote failure into the one [`GatewayError`] shape. The broker
//! reports decimal values as strings; an unparseable field is reported as a
//! transport-kind failure rather than a panic or a silent zero.

use std::collections::HashMap;

use crate::domain::entities::account::AccountInfo;
use crate::domain::entities::order::OrderResult;
use crate::domain::entities::position::Position;
use crate::domain::entities::quote::Quote;
use crate::domain::errors::GatewayError;
use crate::domain::repositories::broker_client::{
    BrokerAccount, BrokerError, BrokerOrder, BrokerPosition, BrokerQuote,
};

pub fn normalize_account(raw: &BrokerAccount) -> Result<AccountInfo, String> {
    Ok(AccountInfo {
        account_number: raw.account_number.clone(),
        status: raw.status.clone(),
        equity: parse_decimal("equity", &raw.equity)?,
        buying_power: parse_decimal("buying_power", &raw.buying_power)?,
        cash: parse_decimal("cash", &raw.cash)?,
        portfolio_value: parse_decimal("portfolio_value", &raw.portfolio_value)?,
        daytrade_count: raw.daytrade_count,
        currency: raw.currency.clone(),
    })
}

/// Normalize a latest-quotes response. Only symbols actually present in the
/// remote response appear in the result: symbols that were requested but
/// not returned are omitted silently, not reported as errors.
pub fn normalize_quotes(raw: HashMap<String, BrokerQuote>) -> HashMap<String, Quote> {
    raw.into_iter()
        .map(|(symbol, quote)| {
            (
                symbol,
                Quote {
                    ask_price: quote.ask_price,
                    bid_price: quote.bid_price,
                    ask_size: quote.ask_size,
                    bid_size: quote.bid_size,
                    timestamp: quote.timestamp,
                },
            )
        })
        .collect()
}

/// Normalize open positions. The current price comes from the embedded
/// record; no per-symbol quote fetch is made. The remote P/L fraction is
/// scaled to a percentage.
pub fn normalize_positions(raw: &[BrokerPosition]) -> Result<Vec<Position>, String> {
    raw.iter().map(normalize_position).collect()
}

fn normalize_position(raw: &BrokerPosition) -> Result<Position, String> {
    Ok(Position {
        symbol: raw.symbol.clone(),
        qty: parse_decimal("qty", &raw.qty)?,
        avg_entry_price: parse_decimal("avg_entry_price", &raw.avg_entry_price)?,
        current_price: parse_optional_decimal("current_price", raw.current_price.as_deref())?,
        market_value: parse_decimal("market_value", &raw.market_value)?,
        unrealized_pl: parse_decimal("unrealized_pl", &raw.unrealized_pl)?,
        unrealized_plpc: parse_decimal("unrealized_plpc", &raw.unrealized_plpc)? * 100.0,
        asset_class: raw.asset_class.clone(),
        exchange: raw.exchange.clone(),
    })
}

pub fn normalize_order(raw: &BrokerOrder) -> Result<OrderResult, String> {
    Ok(OrderResult {
        id: raw.id.clone(),
        client_order_id: raw.client_order_id.clone(),
        symbol: raw.symbol.clone(),
        qty: parse_decimal("qty", &raw.qty)?,
        side: raw.side.clone(),
        order_type: raw.order_type.clone(),
        time_in_force: raw.time_in_force.clone(),
        status: raw.status.clone(),
        created_at: raw.created_at.clone(),
        limit_price: parse_optional_decimal("limit_price", raw.limit_price.as_deref())?,
        stop_price: parse_optional_decimal("stop_price", raw.stop_price.as_deref())?,
    })
}

/// Map a remote failure into the canonical error shape for `operation`.
///
/// Broker domain errors keep their machine code and the verbatim response
/// body; everything else becomes a "Failed to <operation>" transport error.
pub fn normalize_failure(operation: &str, err: BrokerError) -> GatewayError {
    match err {
        BrokerError::Api {
            code,
            message,
            body,
        } => GatewayError::Api {
            operation: operation.to_string(),
            code,
            message,
            raw: body,
        },
        BrokerError::Transport(detail) => GatewayError::Transport {
            operation: operation.to_string(),
            detail,
        },
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("unparseable {} value '{}'", field, value))
}

fn parse_optional_decimal(field: &str, value: Option<&str>) -> Result<Option<f64>, String> {
    value.map(|v| parse_decimal(field, v)).transpose()
}

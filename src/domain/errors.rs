//! Gateway error taxonomy.
//!
//! Every failure mode of the gateway collapses into the single tagged
//! [`GatewayError`] enum. Nothing else crosses the gateway boundary: the
//! HTTP layer turns the variant into a status code and a
//! `{ error, raw_error }` body, and callers can always tell the failure
//! kind apart from the message prefix.

use serde::Serialize;
use thiserror::Error;

use crate::rate_limit::LimitWindow;

/// Common result type for all gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Construction-time failure (missing keys or failed connectivity
    /// probe); permanent for the gateway's lifetime.
    #[error("{reason}")]
    Uninitialized { reason: String },

    /// One of the two shared sliding windows is exhausted. No remote call
    /// was made.
    #[error("Rate limit exceeded for {operation}: {window} window exhausted, retry in ~{retry_after_ms}ms")]
    RateLimited {
        operation: String,
        window: LimitWindow,
        retry_after_ms: u64,
    },

    /// The order request failed local validation. No remote call was made.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The broker rejected the request with its own structured error.
    #[error("Alpaca API error: {message} (Code: {code})")]
    Api {
        operation: String,
        code: i64,
        message: String,
        /// Original response body, verbatim, for diagnostics.
        raw: String,
    },

    /// Anything else: network failure, decode failure, unexpected response.
    #[error("Failed to {operation}: {detail}")]
    Transport { operation: String, detail: String },
}

impl GatewayError {
    /// Raw remote detail preserved for diagnostics, when there is one.
    pub fn raw_error(&self) -> Option<&str> {
        match self {
            GatewayError::Api { raw, .. } => Some(raw),
            GatewayError::Transport { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            raw_error: self.raw_error().map(str::to_string),
        }
    }
}

/// Uniform error body handed to callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_error: Option<String>,
}

/// Order-request validation failures, one distinct message per rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Quantity must be a positive number")]
    NonPositiveQuantity,

    #[error("Invalid side '{0}': must be 'buy' or 'sell'")]
    InvalidSide(String),

    #[error("Invalid order type '{0}': must be one of market, limit, stop, stop_limit, trailing_stop")]
    InvalidOrderType(String),

    #[error("Invalid time in force '{0}': must be one of day, gtc, opg, cls, ioc, fok")]
    InvalidTimeInForce(String),

    #[error("Limit price is required for {0} orders")]
    MissingLimitPrice(String),

    #[error("Stop price is required for {0} orders")]
    MissingStopPrice(String),

    #[error("Trailing stop orders are not supported")]
    TrailingStopUnsupported,
}

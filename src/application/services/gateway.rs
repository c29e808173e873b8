//! Brokerage gateway orchestration.
//!
//! One `TradingGateway` instance is shared by every caller in the process.
//! Each operation runs the same sequence: readiness check, rate-limit
//! admission, (for orders) local validation, remote call, normalization.
//! Local failures never reach the remote; remote failures are normalized
//! into the uniform [`GatewayError`] shape.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::services::normalizer;
use crate::domain::entities::account::AccountInfo;
use crate::domain::entities::order::{OrderRequest, OrderResult};
use crate::domain::entities::position::Position;
use crate::domain::entities::quote::Quote;
use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::repositories::broker_client::{BrokerClient, BrokerOrderRequest};
use crate::domain::services::order_validator;
use crate::rate_limit::{CallRateLimiter, RateLimiterConfig};

const OP_ACCOUNT: &str = "fetch account info";
const OP_QUOTES: &str = "fetch latest quotes";
const OP_POSITIONS: &str = "fetch positions";
const OP_SUBMIT: &str = "submit order";

/// Readiness decided once at construction; immutable afterwards. There is
/// no reconnect logic: a gateway that failed its probe stays unusable.
#[derive(Debug, Clone)]
struct ConnectionState {
    ready: bool,
    failure_reason: Option<String>,
}

pub struct TradingGateway {
    client: Option<Arc<dyn BrokerClient>>,
    limiter: CallRateLimiter,
    connection: ConnectionState,
}

impl TradingGateway {
    /// Build a gateway, probing the remote account endpoint once as a
    /// connectivity check. The probe is not one of the caller-facing
    /// operations and is not charged to the rate limiter.
    pub async fn connect(client: Arc<dyn BrokerClient>) -> Self {
        Self::connect_with_limits(client, RateLimiterConfig::default()).await
    }

    pub async fn connect_with_limits(
        client: Arc<dyn BrokerClient>,
        limits: RateLimiterConfig,
    ) -> Self {
        let connection = match client.fetch_account().await {
            Ok(account) => {
                info!(
                    "Connected to Alpaca, account {} is {}",
                    account.account_number, account.status
                );
                ConnectionState {
                    ready: true,
                    failure_reason: None,
                }
            }
            Err(err) => {
                let reason = format!("Failed to connect to Alpaca API: {}", err);
                warn!("{}", reason);
                ConnectionState {
                    ready: false,
                    failure_reason: Some(reason),
                }
            }
        };

        Self {
            client: Some(client),
            limiter: CallRateLimiter::new(limits),
            connection,
        }
    }

    /// Build a gateway that never became usable, e.g. because credentials
    /// were missing before construction.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            client: None,
            limiter: CallRateLimiter::default(),
            connection: ConnectionState {
                ready: false,
                failure_reason: Some(reason.into()),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.connection.ready
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.connection.failure_reason.as_deref()
    }

    fn ensure_ready(&self) -> GatewayResult<Arc<dyn BrokerClient>> {
        if self.connection.ready {
            if let Some(client) = &self.client {
                return Ok(Arc::clone(client));
            }
        }
        Err(GatewayError::Uninitialized {
            reason: self
                .connection
                .failure_reason
                .clone()
                .unwrap_or_else(|| "Alpaca API not initialized".to_string()),
        })
    }

    pub async fn account_info(&self) -> GatewayResult<AccountInfo> {
        let client = self.ensure_ready()?;
        self.limiter.admit(OP_ACCOUNT)?;
        match client.fetch_account().await {
            Ok(raw) => normalizer::normalize_account(&raw)
                .map_err(|detail| transport(OP_ACCOUNT, detail)),
            Err(err) => Err(normalizer::normalize_failure(OP_ACCOUNT, err)),
        }
    }

    /// Latest quotes for the given symbols. An empty request is answered
    /// locally with an empty map: no remote call, no rate-limit slot.
    /// Symbols missing from the remote response are omitted, not errors.
    pub async fn latest_quotes(&self, symbols: &[String]) -> GatewayResult<HashMap<String, Quote>> {
        let client = self.ensure_ready()?;
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        self.limiter.admit(OP_QUOTES)?;

        let symbols: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
        match client.fetch_latest_quotes(&symbols).await {
            Ok(raw) => Ok(normalizer::normalize_quotes(raw)),
            Err(err) => Err(normalizer::normalize_failure(OP_QUOTES, err)),
        }
    }

    pub async fn open_positions(&self) -> GatewayResult<Vec<Position>> {
        let client = self.ensure_ready()?;
        self.limiter.admit(OP_POSITIONS)?;
        match client.fetch_open_positions().await {
            Ok(raw) => normalizer::normalize_positions(&raw)
                .map_err(|detail| transport(OP_POSITIONS, detail)),
            Err(err) => Err(normalizer::normalize_failure(OP_POSITIONS, err)),
        }
    }

    /// Validate and submit a trade order. Validation failures are returned
    /// as-is and never reach the remote.
    pub async fn submit_order(&self, req: &OrderRequest) -> GatewayResult<OrderResult> {
        let client = self.ensure_ready()?;
        self.limiter.admit(OP_SUBMIT)?;
        order_validator::validate(req)?;

        let payload = BrokerOrderRequest {
            symbol: req.symbol.trim().to_uppercase(),
            qty: req.qty,
            side: req.side.clone(),
            order_type: req.order_type.clone(),
            time_in_force: req.time_in_force.clone(),
            limit_price: req.limit_price,
            stop_price: req.stop_price,
            client_order_id: req.client_order_id.clone(),
        };
        info!(
            "Submitting {} {} order for {} x{}",
            payload.time_in_force, payload.order_type, payload.symbol, payload.qty
        );

        match client.submit_order(&payload).await {
            Ok(raw) => {
                normalizer::normalize_order(&raw).map_err(|detail| transport(OP_SUBMIT, detail))
            }
            Err(err) => Err(normalizer::normalize_failure(OP_SUBMIT, err)),
        }
    }
}

fn transport(operation: &str, detail: String) -> GatewayError {
    GatewayError::Transport {
        operation: operation.to_string(),
        detail,
    }
}

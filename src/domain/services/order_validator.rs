//! Local order-request validation.
//!
//! Runs before any remote call. Rules are checked in a fixed order and the
//! first failure wins, so callers always get one deterministic message for
//! a given bad request.

use crate::domain::entities::order::{OrderRequest, OrderSide, OrderType, TimeInForce};
use crate::domain::errors::ValidationError;

/// Validate an order request. Pure, no I/O.
pub fn validate(req: &OrderRequest) -> Result<(), ValidationError> {
    if req.symbol.trim().is_empty() {
        return Err(ValidationError::EmptySymbol);
    }

    if !(req.qty.is_finite() && req.qty > 0.0) {
        return Err(ValidationError::NonPositiveQuantity);
    }

    let _side: OrderSide = req
        .side
        .parse()
        .map_err(|_| ValidationError::InvalidSide(req.side.clone()))?;

    let order_type: OrderType = req
        .order_type
        .parse()
        .map_err(|_| ValidationError::InvalidOrderType(req.order_type.clone()))?;

    let _tif: TimeInForce = req
        .time_in_force
        .parse()
        .map_err(|_| ValidationError::InvalidTimeInForce(req.time_in_force.clone()))?;

    if order_type.requires_limit_price() && req.limit_price.is_none() {
        return Err(ValidationError::MissingLimitPrice(
            order_type.as_str().to_string(),
        ));
    }

    if order_type.requires_stop_price() && req.stop_price.is_none() {
        return Err(ValidationError::MissingStopPrice(
            order_type.as_str().to_string(),
        ));
    }

    // The wire field carrying trail amount/percent is not modeled, so
    // forwarding a trailing stop would submit an incomplete order.
    if order_type == OrderType::TrailingStop {
        return Err(ValidationError::TrailingStopUnsupported);
    }

    Ok(())
}

//! End-to-end gateway tests against a scriptable mock broker.
//!
//! These exercise the full per-operation sequence (readiness, rate-limit
//! admission, validation, remote call, normalization) and count remote
//! calls to prove that locally rejected operations never leave the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use alpaca_gateway::application::services::gateway::TradingGateway;
use alpaca_gateway::domain::entities::order::OrderRequest;
use alpaca_gateway::domain::errors::GatewayError;
use alpaca_gateway::domain::repositories::broker_client::{
    BrokerAccount, BrokerClient, BrokerError, BrokerOrder, BrokerOrderRequest, BrokerPosition,
    BrokerQuote, BrokerResult,
};
use alpaca_gateway::rate_limit::{LimitWindow, RateLimiterConfig};

/// Scriptable broker: canned responses plus a remote-call counter and a
/// capture of the last submitted order payload.
struct MockBroker {
    account: BrokerResult<BrokerAccount>,
    quotes: BrokerResult<HashMap<String, BrokerQuote>>,
    positions: BrokerResult<Vec<BrokerPosition>>,
    order: BrokerResult<BrokerOrder>,
    calls: AtomicUsize,
    last_order: Mutex<Option<BrokerOrderRequest>>,
}

impl MockBroker {
    fn healthy() -> Self {
        Self {
            account: Ok(sample_account()),
            quotes: Ok(HashMap::new()),
            positions: Ok(Vec::new()),
            order: Ok(sample_order()),
            calls: AtomicUsize::new(0),
            last_order: Mutex::new(None),
        }
    }

    fn remote_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_order(&self) -> Option<BrokerOrderRequest> {
        self.last_order.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl BrokerClient for MockBroker {
    async fn fetch_account(&self) -> BrokerResult<BrokerAccount> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.account.clone()
    }

    async fn fetch_latest_quotes(
        &self,
        _symbols: &[String],
    ) -> BrokerResult<HashMap<String, BrokerQuote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes.clone()
    }

    async fn fetch_open_positions(&self) -> BrokerResult<Vec<BrokerPosition>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.positions.clone()
    }

    async fn submit_order(&self, order: &BrokerOrderRequest) -> BrokerResult<BrokerOrder> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_order.lock().expect("mock lock poisoned") = Some(order.clone());
        self.order.clone()
    }
}

fn sample_account() -> BrokerAccount {
    BrokerAccount {
        account_number: "123456789".to_string(),
        status: "ACTIVE".to_string(),
        equity: "100000.00".to_string(),
        buying_power: "200000.00".to_string(),
        cash: "50000.00".to_string(),
        portfolio_value: "100000.00".to_string(),
        daytrade_count: 0,
        currency: "USD".to_string(),
    }
}

fn sample_order() -> BrokerOrder {
    BrokerOrder {
        id: "1".to_string(),
        client_order_id: None,
        symbol: "AAPL".to_string(),
        qty: "10".to_string(),
        side: "buy".to_string(),
        order_type: "market".to_string(),
        time_in_force: "day".to_string(),
        status: "accepted".to_string(),
        created_at: Some("2024-05-01T14:30:00Z".parse().expect("valid timestamp")),
        limit_price: None,
        stop_price: None,
    }
}

fn sample_quote() -> BrokerQuote {
    BrokerQuote {
        ask_price: 178.55,
        bid_price: 178.5,
        ask_size: 3,
        bid_size: 5,
        timestamp: Some("2024-05-01T14:30:00Z".parse().expect("valid timestamp")),
    }
}

fn market_order(symbol: &str, qty: f64) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        qty,
        side: "buy".to_string(),
        order_type: "market".to_string(),
        time_in_force: "day".to_string(),
        limit_price: None,
        stop_price: None,
        client_order_id: None,
    }
}

fn limits(fast: u32, slow: u32) -> RateLimiterConfig {
    RateLimiterConfig {
        fast_capacity: fast,
        fast_period: std::time::Duration::from_secs(1),
        slow_capacity: slow,
        slow_period: std::time::Duration::from_secs(60),
    }
}

async fn connect(broker: Arc<MockBroker>) -> TradingGateway {
    TradingGateway::connect(broker as Arc<dyn BrokerClient>).await
}

async fn connect_with_limits(
    broker: Arc<MockBroker>,
    config: RateLimiterConfig,
) -> TradingGateway {
    TradingGateway::connect_with_limits(broker as Arc<dyn BrokerClient>, config).await
}

#[tokio::test]
async fn fast_window_rejection_makes_no_remote_call() {
    let mut broker = MockBroker::healthy();
    broker.quotes = Ok(HashMap::from([("AAPL".to_string(), sample_quote())]));
    let broker = Arc::new(broker);
    let gateway = connect_with_limits(broker.clone(), limits(3, 100)).await;
    let symbols = vec!["AAPL".to_string()];

    for _ in 0..3 {
        gateway
            .latest_quotes(&symbols)
            .await
            .expect("within fast window");
    }
    let err = gateway.latest_quotes(&symbols).await.unwrap_err();
    match err {
        GatewayError::RateLimited { window, .. } => assert_eq!(window, LimitWindow::Fast),
        other => panic!("expected RateLimited, got {:?}", other),
    }
    // One probe at construction plus the three admitted calls.
    assert_eq!(broker.remote_calls(), 4);
}

#[tokio::test]
async fn slow_window_rejection_names_slow_window() {
    let broker = Arc::new(MockBroker::healthy());
    let gateway = connect_with_limits(broker.clone(), limits(100, 2)).await;

    gateway.account_info().await.expect("first call admitted");
    gateway.open_positions().await.expect("second call admitted");

    let err = gateway.account_info().await.unwrap_err();
    match err {
        GatewayError::RateLimited {
            window,
            ref operation,
            ..
        } => {
            assert_eq!(window, LimitWindow::Slow);
            assert_eq!(operation, "fetch account info");
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
    assert_eq!(broker.remote_calls(), 3);
}

#[tokio::test]
async fn empty_quote_request_is_answered_locally() {
    let broker = Arc::new(MockBroker::healthy());
    let gateway = connect(broker.clone()).await;

    let quotes = gateway.latest_quotes(&[]).await.expect("empty success");
    assert!(quotes.is_empty());
    // Probe only; the empty request neither called out nor took a slot.
    assert_eq!(broker.remote_calls(), 1);
}

#[tokio::test]
async fn symbols_missing_from_response_are_omitted_not_errors() {
    let mut broker = MockBroker::healthy();
    broker.quotes = Ok(HashMap::from([("GOOD".to_string(), sample_quote())]));
    let broker = Arc::new(broker);
    let gateway = connect(broker).await;

    let quotes = gateway
        .latest_quotes(&["GOOD".to_string(), "BAD".to_string()])
        .await
        .expect("partial response is a success");
    assert_eq!(quotes.len(), 1);
    assert!(quotes.contains_key("GOOD"));
    assert!(!quotes.contains_key("BAD"));
}

#[tokio::test]
async fn limit_order_without_limit_price_never_reaches_remote() {
    let broker = Arc::new(MockBroker::healthy());
    let gateway = connect(broker.clone()).await;

    let mut req = market_order("AAPL", 10.0);
    req.order_type = "limit".to_string();
    let err = gateway.submit_order(&req).await.unwrap_err();

    assert!(matches!(err, GatewayError::Validation(_)));
    assert_eq!(err.to_string(), "Limit price is required for limit orders");
    assert_eq!(broker.remote_calls(), 1);
}

#[tokio::test]
async fn valid_market_order_yields_exact_order_result() {
    let broker = Arc::new(MockBroker::healthy());
    let gateway = connect(broker.clone()).await;

    let result = gateway
        .submit_order(&market_order("AAPL", 10.0))
        .await
        .expect("order accepted");

    assert_eq!(result.id, "1");
    assert_eq!(result.status, "accepted");
    assert_eq!(result.symbol, "AAPL");
    assert_eq!(result.qty, 10.0);
    assert_eq!(result.side, "buy");
    assert_eq!(result.order_type, "market");
    assert_eq!(result.time_in_force, "day");
}

#[tokio::test]
async fn order_symbol_is_uppercased_before_submission() {
    let broker = Arc::new(MockBroker::healthy());
    let gateway = connect(broker.clone()).await;

    gateway
        .submit_order(&market_order(" aapl ", 10.0))
        .await
        .expect("order accepted");

    let sent = broker.last_order().expect("order captured");
    assert_eq!(sent.symbol, "AAPL");
}

#[tokio::test]
async fn failed_probe_is_permanent_and_stops_remote_traffic() {
    let mut broker = MockBroker::healthy();
    broker.account = Err(BrokerError::Api {
        code: 503,
        message: "Service Unavailable".to_string(),
        body: "Service Unavailable".to_string(),
    });
    let broker = Arc::new(broker);
    let gateway = connect(broker.clone()).await;

    assert!(!gateway.is_ready());
    let first = gateway.account_info().await.unwrap_err().to_string();
    let second = gateway.latest_quotes(&["AAPL".to_string()]).await.unwrap_err().to_string();
    let third = gateway
        .submit_order(&market_order("AAPL", 1.0))
        .await
        .unwrap_err()
        .to_string();

    assert!(first.contains("Failed to connect to Alpaca API"));
    assert!(first.contains("503"));
    assert_eq!(first, second);
    assert_eq!(first, third);
    // Only the construction probe ever reached the remote.
    assert_eq!(broker.remote_calls(), 1);
}

#[tokio::test]
async fn broker_rejection_is_normalized_with_code_and_raw_body() {
    let raw_body = r#"{"code":403,"message":"insufficient buying power"}"#;
    let mut broker = MockBroker::healthy();
    broker.order = Err(BrokerError::Api {
        code: 403,
        message: "insufficient buying power".to_string(),
        body: raw_body.to_string(),
    });
    let broker = Arc::new(broker);
    let gateway = connect(broker).await;

    let err = gateway
        .submit_order(&market_order("AAPL", 10.0))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Alpaca API error"));
    assert!(msg.contains("403"));
    assert_eq!(err.raw_error(), Some(raw_body));
}

#[tokio::test]
async fn transport_failure_is_normalized_with_operation_name() {
    let mut broker = MockBroker::healthy();
    broker.positions = Err(BrokerError::Transport("connection reset by peer".to_string()));
    let broker = Arc::new(broker);
    let gateway = connect(broker).await;

    let err = gateway.open_positions().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to fetch positions: connection reset by peer"
    );
}

#[tokio::test]
async fn account_info_is_idempotent_against_unchanged_remote() {
    let broker = Arc::new(MockBroker::healthy());
    let gateway = connect(broker).await;

    let first = gateway.account_info().await.expect("first fetch");
    let second = gateway.account_info().await.expect("second fetch");
    assert_eq!(first, second);
    assert_eq!(first.equity, 100000.0);
    assert_eq!(first.account_number, "123456789");
}

#[tokio::test]
async fn positions_are_enriched_from_the_embedded_record() {
    let mut broker = MockBroker::healthy();
    broker.positions = Ok(vec![BrokerPosition {
        symbol: "AAPL".to_string(),
        qty: "10".to_string(),
        avg_entry_price: "150.00".to_string(),
        current_price: Some("157.50".to_string()),
        market_value: "1575.00".to_string(),
        unrealized_pl: "75.00".to_string(),
        unrealized_plpc: "0.05".to_string(),
        asset_class: "us_equity".to_string(),
        exchange: "NASDAQ".to_string(),
    }]);
    let broker = Arc::new(broker);
    let gateway = connect(broker.clone()).await;

    let positions = gateway.open_positions().await.expect("positions fetched");
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].current_price, Some(157.5));
    assert_eq!(positions[0].unrealized_plpc, 5.0);
    // Probe plus one positions fetch: no per-symbol quote lookups.
    assert_eq!(broker.remote_calls(), 2);
}

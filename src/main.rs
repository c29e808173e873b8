use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alpaca_gateway::application::services::gateway::TradingGateway;
use alpaca_gateway::auth;
use alpaca_gateway::config::{AlpacaConfig, ServerConfig};
use alpaca_gateway::domain::entities::account::AccountReport;
use alpaca_gateway::domain::entities::order::{OrderRequest, OrderResult};
use alpaca_gateway::domain::entities::position::Position;
use alpaca_gateway::domain::entities::quote::Quote;
use alpaca_gateway::domain::errors::{ErrorBody, GatewayError};
use alpaca_gateway::infrastructure::alpaca_client::AlpacaRestClient;

type ApiError = (StatusCode, Json<ErrorBody>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alpaca_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    auth::init_api_keys()?;

    // Missing credentials or a failed connectivity probe produce a gateway
    // that answers every call with the stored failure instead of aborting
    // the server: /health still reports what went wrong.
    let gateway = match AlpacaConfig::from_env() {
        Ok(config) => {
            let client = AlpacaRestClient::new(config)?;
            TradingGateway::connect(Arc::new(client)).await
        }
        Err(err) => {
            error!("Gateway unavailable: {}", err);
            TradingGateway::unavailable(err.to_string())
        }
    };
    if gateway.is_ready() {
        info!("Gateway connected and ready");
    } else if let Some(reason) = gateway.failure_reason() {
        warn!("Gateway starting in unavailable state: {}", reason);
    }
    let gateway = Arc::new(gateway);

    let protected = Router::new()
        .route("/account", get(get_account))
        .route("/positions", get(get_positions))
        .route("/quotes/:symbols", get(get_quotes))
        .route("/orders", post(submit_order))
        .route_layer(middleware::from_fn(auth::require_auth));

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway.clone());

    let server_config = ServerConfig::from_env();
    info!("Listening on {}", server_config.bind_addr);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    let server = axum::serve(listener, app);

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    server.with_graceful_shutdown(shutdown_signal).await?;
    info!("Server shut down gracefully");
    Ok(())
}

/// Health check endpoint
async fn health_check(
    State(gateway): State<Arc<TradingGateway>>,
) -> Json<HashMap<String, serde_json::Value>> {
    let mut response = HashMap::new();
    response.insert("status".to_string(), serde_json::json!("running"));
    response.insert(
        "gateway_ready".to_string(),
        serde_json::json!(gateway.is_ready()),
    );
    if let Some(reason) = gateway.failure_reason() {
        response.insert("error".to_string(), serde_json::json!(reason));
    }
    Json(response)
}

/// Account snapshot with boundary-formatted currency strings.
async fn get_account(
    State(gateway): State<Arc<TradingGateway>>,
) -> Result<Json<AccountReport>, ApiError> {
    gateway
        .account_info()
        .await
        .map(|info| Json(info.to_report()))
        .map_err(error_response)
}

async fn get_positions(
    State(gateway): State<Arc<TradingGateway>>,
) -> Result<Json<Vec<Position>>, ApiError> {
    gateway
        .open_positions()
        .await
        .map(Json)
        .map_err(error_response)
}

/// Latest quotes for a comma-separated symbol list.
async fn get_quotes(
    State(gateway): State<Arc<TradingGateway>>,
    Path(symbols): Path<String>,
) -> Result<Json<HashMap<String, Quote>>, ApiError> {
    let symbols: Vec<String> = symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    gateway
        .latest_quotes(&symbols)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn submit_order(
    State(gateway): State<Arc<TradingGateway>>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<OrderResult>, ApiError> {
    gateway
        .submit_order(&req)
        .await
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: GatewayError) -> ApiError {
    (status_for(&err), Json(err.to_body()))
}

/// Map the gateway's error kinds to transport-appropriate status codes.
fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::Uninitialized { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
        GatewayError::Api { code, .. } => match *code {
            403 => StatusCode::FORBIDDEN,
            422 => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        },
        GatewayError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

//! # Alpaca REST Client
//!
//! Raw HTTP boundary to the Alpaca trading and market-data hosts. This
//! layer does transport and decoding only; rate limiting, validation and
//! normalization live above it in the gateway.
//!
//! ## Authentication
//!
//! Every request carries the `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY`
//! header pair.
//!
//! ## References
//!
//! - Trading API: https://docs.alpaca.markets/reference/getaccount-1
//! - Market data API: https://docs.alpaca.markets/reference/stocklatestquotes-1

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::config::AlpacaConfig;
use crate::domain::repositories::broker_client::{
    BrokerAccount, BrokerClient, BrokerError, BrokerOrder, BrokerOrderRequest, BrokerPosition,
    BrokerQuote, BrokerResult,
};

const USER_AGENT: &str = "alpaca-gateway/0.1.0";

/// Error body shape used by the Alpaca API.
#[derive(Debug, Deserialize)]
struct AlpacaErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Envelope of the latest-quotes endpoint.
#[derive(Debug, Deserialize)]
struct LatestQuotesResponse {
    #[serde(default)]
    quotes: HashMap<String, BrokerQuote>,
}

/// Alpaca REST client
pub struct AlpacaRestClient {
    client: Client,
    config: AlpacaConfig,
}

impl std::fmt::Debug for AlpacaRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaRestClient")
            .field("config", &self.config)
            .finish()
    }
}

impl AlpacaRestClient {
    pub fn new(config: AlpacaConfig) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    fn auth_get(&self, base: &str, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", base, path))
            .header("APCA-API-KEY-ID", &self.config.key_id)
            .header("APCA-API-SECRET-KEY", self.config.secret_key.as_str())
    }

    fn auth_post(&self, base: &str, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", base, path))
            .header("APCA-API-KEY-ID", &self.config.key_id)
            .header("APCA-API-SECRET-KEY", self.config.secret_key.as_str())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> BrokerResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| BrokerError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BrokerError::Transport(e.to_string()))?;

        if !status.is_success() {
            debug!("Alpaca request failed: {} - {}", status, body);
            return Err(api_error(status, body));
        }

        serde_json::from_str(&body)
            .map_err(|e| BrokerError::Transport(format!("failed to decode response: {}", e)))
    }
}

/// Build a domain error from a non-success response. The Alpaca API reports
/// a JSON `{code, message}` body; anything else falls back to the HTTP
/// status. The body is preserved verbatim either way.
fn api_error(status: StatusCode, body: String) -> BrokerError {
    match serde_json::from_str::<AlpacaErrorBody>(&body) {
        Ok(parsed) => BrokerError::Api {
            code: parsed.code.unwrap_or_else(|| i64::from(status.as_u16())),
            message: parsed
                .message
                .unwrap_or_else(|| status_label(status).to_string()),
            body,
        },
        Err(_) => BrokerError::Api {
            code: i64::from(status.as_u16()),
            message: if body.trim().is_empty() {
                status_label(status).to_string()
            } else {
                body.clone()
            },
            body,
        },
    }
}

fn status_label(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("unknown error")
}

#[async_trait]
impl BrokerClient for AlpacaRestClient {
    async fn fetch_account(&self) -> BrokerResult<BrokerAccount> {
        self.send(self.auth_get(&self.config.trading_base_url, "/v2/account"))
            .await
    }

    async fn fetch_latest_quotes(
        &self,
        symbols: &[String],
    ) -> BrokerResult<HashMap<String, BrokerQuote>> {
        let request = self
            .auth_get(&self.config.data_base_url, "/v2/stocks/quotes/latest")
            .query(&[("symbols", symbols.join(","))]);
        let response: LatestQuotesResponse = self.send(request).await?;
        Ok(response.quotes)
    }

    async fn fetch_open_positions(&self) -> BrokerResult<Vec<BrokerPosition>> {
        self.send(self.auth_get(&self.config.trading_base_url, "/v2/positions"))
            .await
    }

    async fn submit_order(&self, order: &BrokerOrderRequest) -> BrokerResult<BrokerOrder> {
        self.send(
            self.auth_post(&self.config.trading_base_url, "/v2/orders")
                .json(order),
        )
        .await
    }
}

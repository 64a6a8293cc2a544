//! Order-submission client: a thin pass-through to the trading backend.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::models::OrderIntent;

use super::types::{OrderRequest, OrderResponse};
use super::ExecutionBackend;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the external trading backend.
///
/// Order signing, balances, and matching all live behind the backend;
/// this client only relays the fully specified intent.
pub struct RestExecutionClient {
    client: Client,
    base_url: String,
}

impl RestExecutionClient {
    /// Create a client against the given backend base URL.
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ExecutionBackend for RestExecutionClient {
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderResponse> {
        let url = format!("{}/orders", self.base_url);
        let body = OrderRequest {
            asset_id: intent.asset_id.clone(),
            side: intent.side.as_str().to_string(),
            notional: intent.notional,
            limit_price: intent.limit_price,
            fill_mode: intent.fill_mode.as_str().to_string(),
        };

        debug!(url = %url, asset = %body.asset_id, "Submitting order");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to submit order")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Order request failed: {} - {}", status, text);
        }

        response
            .json()
            .await
            .context("Failed to parse order response")
    }
}

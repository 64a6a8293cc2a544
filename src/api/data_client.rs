//! Data API client: leaderboard fetches and the polling trade source.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{TradeEvent, TradeSide};

use super::types::{LeaderboardEntry, TradeFillResponse};
use super::{SourceMessage, TradeSource};

const DATA_API_BASE: &str = "https://data-api.polymarket.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The API caps leaderboard pages at 50 entries.
const LEADERBOARD_PAGE_SIZE: usize = 50;

/// How many recent fills each poll requests.
const POLL_PAGE_SIZE: usize = 100;

/// Client for the exchange's read-only data API.
///
/// Implements [`super::LeaderboardProvider`] for cohort refreshes and
/// [`TradeSource`] by polling the global fill feed and forwarding fills
/// not seen on a previous poll.
pub struct DataClient {
    client: Client,
    base_url: String,
    poll_interval: Duration,
}

impl DataClient {
    /// Create a new data client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DATA_API_BASE.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Override how often the fill feed is polled.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Fetch one leaderboard page.
    async fn fetch_leaderboard_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let url = format!(
            "{}/v1/leaderboard?orderBy=PNL&limit={}&offset={}",
            self.base_url,
            limit.min(LEADERBOARD_PAGE_SIZE),
            offset
        );

        debug!(url = %url, "Fetching leaderboard");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch leaderboard")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Leaderboard request failed: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse leaderboard response")
    }

    /// Fetch the most recent fills across all markets, newest first.
    async fn fetch_recent_fills(&self) -> Result<Vec<TradeFillResponse>> {
        let url = format!(
            "{}/trades?takerOnly=true&limit={}",
            self.base_url, POLL_PAGE_SIZE
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch trades")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Trades request failed: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse trades response")
    }
}

#[async_trait]
impl super::LeaderboardProvider for DataClient {
    async fn fetch_top_wallets(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0;

        while entries.len() < limit {
            let policy = ExponentialBackoffBuilder::new()
                .with_max_elapsed_time(Some(Duration::from_secs(15)))
                .build();

            let page = backoff::future::retry(policy, || async {
                self.fetch_leaderboard_page(limit - entries.len(), offset)
                    .await
                    .map_err(backoff::Error::transient)
            })
            .await?;

            if page.is_empty() {
                break;
            }

            offset += page.len();
            entries.extend(page);
        }

        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl TradeSource for DataClient {
    async fn stream(&self, tx: mpsc::Sender<SourceMessage>) {
        let mut seen: HashSet<String> = HashSet::new();
        let mut primed = false;
        let mut ticker = tokio::time::interval(self.poll_interval);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                return;
            }

            match self.fetch_recent_fills().await {
                Ok(fills) => {
                    let fresh: Vec<TradeFillResponse> = fills
                        .iter()
                        .filter(|f| !seen.contains(&fill_key(f)))
                        .cloned()
                        .collect();

                    for fill in &fills {
                        seen.insert(fill_key(fill));
                    }
                    // A fill older than the current page can no longer
                    // reappear in later responses.
                    if seen.len() > POLL_PAGE_SIZE * 4 {
                        seen = fills.iter().map(fill_key).collect();
                    }

                    // The first poll only establishes the high-water mark;
                    // replaying history would copy stale trades.
                    if !primed {
                        primed = true;
                        continue;
                    }

                    // API returns newest first; deliver oldest first.
                    for fill in fresh.into_iter().rev() {
                        let Some(event) = convert_fill(fill) else {
                            continue;
                        };
                        if tx.send(SourceMessage::Trade(event)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Trade poll failed");
                    if tx
                        .send(SourceMessage::Error(e.to_string()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
    }
}

fn fill_key(fill: &TradeFillResponse) -> String {
    format!("{}_{}", fill.transaction_hash, fill.timestamp)
}

/// Convert a raw fill into a stream event; fills with an unknown side
/// are dropped.
fn convert_fill(fill: TradeFillResponse) -> Option<TradeEvent> {
    let side = match TradeSide::from_api_str(&fill.side) {
        Some(side) => side,
        None => {
            warn!(side = %fill.side, "Unknown trade side");
            return None;
        }
    };

    let timestamp = Utc.timestamp_opt(fill.timestamp, 0).single()?;

    Some(TradeEvent {
        trader_address: Some(fill.proxy_wallet).filter(|a| !a.is_empty()),
        trader_name: Some(fill.pseudonym).filter(|p| !p.is_empty()),
        market_id: fill.condition_id,
        side,
        size: fill.size,
        price: fill.price,
        asset_id: Some(fill.asset).filter(|a| !a.is_empty()),
        outcome: fill.outcome,
        transaction_hash: fill.transaction_hash,
        timestamp,
    })
}

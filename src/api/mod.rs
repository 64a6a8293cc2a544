//! Collaborator interfaces and their HTTP implementations.
//!
//! The engine consumes three external contracts: a leaderboard provider
//! (who is worth copying), a trade stream source (what just traded), and
//! an execution backend (place the replica order). Each is a trait so
//! tests can substitute in-memory fakes.

mod data_client;
mod exec_client;
mod types;

pub use data_client::DataClient;
pub use exec_client::RestExecutionClient;
pub use types::{LeaderboardEntry, OrderRequest, OrderResponse, TradeFillResponse};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::{OrderIntent, TradeEvent};

/// One message from a trade stream source.
#[derive(Debug)]
pub enum SourceMessage {
    /// A fill observed on the exchange
    Trade(TradeEvent),
    /// A transient source failure; the stream stays up
    Error(String),
}

/// Ranked-wallet data provider.
#[async_trait]
pub trait LeaderboardProvider: Send + Sync {
    /// Fetch up to `limit` top-ranked wallets, best first.
    async fn fetch_top_wallets(&self, limit: usize) -> Result<Vec<LeaderboardEntry>>;
}

/// Continuous source of exchange fills.
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Push raw events into `tx` until the task is aborted or the
    /// receiver closes. Transient failures are reported as
    /// [`SourceMessage::Error`] and must not end the stream.
    async fn stream(&self, tx: mpsc::Sender<SourceMessage>);
}

/// Order-submission backend.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submit a replica order. A rejection is returned in the payload;
    /// transport failures are an `Err`.
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderResponse>;
}

//! Wire types for the data API and the order-submission backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Leaderboard entry from the /leaderboard endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: Option<String>,
    pub proxy_wallet: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub vol: f64,
    #[serde(default)]
    pub pnl: f64,
}

/// Raw fill from the /trades endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFillResponse {
    pub proxy_wallet: String,
    pub side: String,
    #[serde(default)]
    pub asset: String,
    pub condition_id: String,
    pub size: Decimal,
    pub price: Decimal,
    pub timestamp: i64,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default)]
    pub pseudonym: String,
}

/// Order submission request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub asset_id: String,
    pub side: String,
    pub notional: Decimal,
    pub limit_price: Decimal,
    pub fill_mode: String,
}

/// Response from order submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub success: bool,
    pub order_id: Option<String>,
    #[serde(default)]
    pub error_msg: String,
}

//! In-memory fakes for exercising the engine without network I/O.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::api::{
    ExecutionBackend, LeaderboardEntry, LeaderboardProvider, OrderResponse, SourceMessage,
    TradeSource,
};
use crate::models::{ObservedTrade, OrderIntent, TradeEvent, TradeSide};
use crate::trading::{CopySession, SessionStats};

pub fn entry(address: &str, pnl: f64, volume: f64) -> LeaderboardEntry {
    LeaderboardEntry {
        rank: None,
        proxy_wallet: address.to_string(),
        user_name: String::new(),
        vol: volume,
        pnl,
    }
}

pub fn sample_event(trader: &str, size: Decimal, price: Decimal) -> TradeEvent {
    TradeEvent {
        trader_address: Some(trader.to_string()),
        trader_name: None,
        market_id: "0xmarket".to_string(),
        side: TradeSide::Buy,
        size,
        price,
        asset_id: Some("1234".to_string()),
        outcome: "Yes".to_string(),
        transaction_hash: "0xtx".to_string(),
        timestamp: Utc::now(),
    }
}

pub fn observed_trade(trader: &str, size: Decimal, price: Decimal) -> ObservedTrade {
    ObservedTrade {
        trader_address: trader.to_string(),
        trader_name: None,
        market_id: "0xmarket".to_string(),
        side: TradeSide::Buy,
        size,
        price,
        asset_id: Some("1234".to_string()),
        outcome: "Yes".to_string(),
        transaction_hash: "0xtx".to_string(),
        timestamp: Utc::now(),
        smart_money: false,
        wallet: None,
    }
}

/// Leaderboard provider backed by a fixed entry list, counting calls so
/// tests can assert cache behavior.
pub struct StaticLeaderboard {
    entries: Mutex<Vec<LeaderboardEntry>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl StaticLeaderboard {
    pub fn new(entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_entries(&self, entries: Vec<LeaderboardEntry>) {
        *self.entries.lock().unwrap() = entries;
    }
}

#[async_trait]
impl LeaderboardProvider for StaticLeaderboard {
    async fn fetch_top_wallets(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("provider unavailable");
        }
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().take(limit).cloned().collect())
    }
}

/// Trade source that plays a fixed script, then stays connected.
pub struct ScriptedSource {
    events: Vec<TradeEvent>,
    errors: Vec<String>,
}

impl ScriptedSource {
    pub fn new(events: Vec<TradeEvent>) -> Self {
        Self {
            events,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

#[async_trait]
impl TradeSource for ScriptedSource {
    async fn stream(&self, tx: mpsc::Sender<SourceMessage>) {
        // Give the test time to attach every listener before the first
        // event lands.
        tokio::time::sleep(Duration::from_millis(50)).await;

        for event in self.events.clone() {
            if tx.send(SourceMessage::Trade(event)).await.is_err() {
                return;
            }
        }
        for error in self.errors.clone() {
            if tx.send(SourceMessage::Error(error)).await.is_err() {
                return;
            }
        }

        // Keep the channel open the way a live stream would
        std::future::pending::<()>().await;
    }
}

enum BackendMode {
    Succeed,
    Reject(String),
    Error,
}

/// Execution backend recording every submission.
pub struct RecordingBackend {
    pub calls: AtomicUsize,
    mode: BackendMode,
}

impl RecordingBackend {
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            mode: BackendMode::Succeed,
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            mode: BackendMode::Reject(reason.to_string()),
        }
    }

    pub fn erroring() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            mode: BackendMode::Error,
        }
    }
}

#[async_trait]
impl ExecutionBackend for RecordingBackend {
    async fn submit_order(&self, _intent: &OrderIntent) -> Result<OrderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            BackendMode::Succeed => Ok(OrderResponse {
                success: true,
                order_id: Some("ord-1".to_string()),
                error_msg: String::new(),
            }),
            BackendMode::Reject(reason) => Ok(OrderResponse {
                success: false,
                order_id: None,
                error_msg: reason.clone(),
            }),
            BackendMode::Error => anyhow::bail!("backend unreachable"),
        }
    }
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}

/// Poll a session's stats until `pred` holds, panicking after two seconds.
pub async fn wait_for_stats<F>(session: &CopySession, pred: F)
where
    F: Fn(&SessionStats) -> bool,
{
    for _ in 0..200 {
        if pred(&session.stats().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("stats condition not met within 2s");
}

//! Copy-session statistics and lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::feed::Subscription;

/// Running counters for one auto-copy session.
///
/// Counters only ever increase, and `detected` is always at least
/// `executed + skipped + failed` because detection is recorded before
/// the terminal outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Qualifying source trades seen
    pub detected: u64,

    /// Replicas executed (or simulated in dry-run)
    pub executed: u64,

    /// Trades rejected by sizing or filtering rules
    pub skipped: u64,

    /// Replicas the backend rejected or errored on
    pub failed: u64,

    /// Cumulative USDC committed to executed replicas
    pub total_spent: Decimal,
}

impl SessionStats {
    pub fn record_detected(&mut self) {
        self.detected += 1;
    }

    pub fn record_executed(&mut self, notional: Decimal) {
        self.executed += 1;
        self.total_spent += notional;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Copy Session Statistics ===")?;
        writeln!(f, "Detected:    {}", self.detected)?;
        writeln!(f, "Executed:    {}", self.executed)?;
        writeln!(f, "Skipped:     {}", self.skipped)?;
        writeln!(f, "Failed:      {}", self.failed)?;
        writeln!(f, "Total Spent: ${:.2}", self.total_spent)?;
        Ok(())
    }
}

/// One active auto-copy session.
///
/// Lives until `stop()` or process exit. Stopping detaches the listener
/// from the shared stream; trades already mid-flight are allowed to
/// complete so no order is half-submitted.
pub struct CopySession {
    id: Uuid,
    target_addresses: Vec<String>,
    started_at: DateTime<Utc>,
    stats: Arc<RwLock<SessionStats>>,
    subscription: Subscription,
    stopped: AtomicBool,
}

impl CopySession {
    pub(crate) fn new(
        id: Uuid,
        target_addresses: Vec<String>,
        stats: Arc<RwLock<SessionStats>>,
        subscription: Subscription,
    ) -> Self {
        Self {
            id,
            target_addresses,
            started_at: Utc::now(),
            stats,
            subscription,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The resolved wallet set this session copies, lower-cased and
    /// deduplicated.
    pub fn target_addresses(&self) -> &[String] {
        &self.target_addresses
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Snapshot of the live counters. Callers get a copy; the session's
    /// own counters cannot be mutated from outside.
    pub async fn stats(&self) -> SessionStats {
        self.stats.read().await.clone()
    }

    /// Detach from the stream. Safe to call more than once.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscription.unsubscribe().await;
        info!(id = %self.id, "Copy session stopped");
    }
}

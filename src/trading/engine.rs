//! Engine facade: cohort selection, trade subscriptions, auto-copy.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ExecutionBackend, LeaderboardProvider, TradeSource};
use crate::models::{ObservedTrade, RankedWallet};

use super::cohort::CohortTracker;
use super::config::{CohortConfig, CopyConfig};
use super::executor::{Dispatcher, ExecutionOutcome};
use super::feed::{ErrorCallback, Subscription, TradeCallback, TradeFeed};
use super::filter::TradeFilter;
use super::session::{CopySession, SessionStats};
use super::sizing::{self, SkipReason};

/// Copy-trading engine.
///
/// Owns the cohort cache and the shared stream subscription; all state
/// is per-instance, so independent engines can coexist in one process.
pub struct CopyEngine {
    cohort: Arc<CohortTracker>,
    feed: TradeFeed,
    backend: Arc<dyn ExecutionBackend>,
}

impl CopyEngine {
    pub fn new(
        provider: Arc<dyn LeaderboardProvider>,
        source: Arc<dyn TradeSource>,
        backend: Arc<dyn ExecutionBackend>,
        cohort_config: CohortConfig,
    ) -> Self {
        let cohort = Arc::new(CohortTracker::new(provider, cohort_config));
        let feed = TradeFeed::new(source, cohort.clone());
        Self {
            cohort,
            feed,
            backend,
        }
    }

    /// Get up to `limit` smart-money wallets, refreshing the cohort
    /// cache if stale.
    pub async fn select_cohort(&self, limit: usize) -> Result<Vec<RankedWallet>> {
        self.cohort.get_cohort(limit).await
    }

    /// Whether `address` currently belongs to the smart-money cohort.
    pub async fn is_cohort_member(&self, address: &str) -> bool {
        match self.cohort.is_smart_money(address).await {
            Ok(member) => member,
            Err(e) => {
                warn!(error = %e, "Cohort membership check failed");
                false
            }
        }
    }

    /// Cohort snapshot for `address`, if currently a member.
    pub async fn cohort_info(&self, address: &str) -> Option<RankedWallet> {
        match self.cohort.wallet_info(address).await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Cohort lookup failed");
                None
            }
        }
    }

    /// Register a listener on the shared trade stream.
    pub async fn subscribe_trades<F>(&self, filter: TradeFilter, on_trade: F) -> Subscription
    where
        F: Fn(ObservedTrade) + Send + Sync + 'static,
    {
        let on_trade = Arc::new(on_trade);
        let callback: TradeCallback = Arc::new(move |trade: ObservedTrade| {
            let on_trade = on_trade.clone();
            async move {
                on_trade(trade);
            }
            .boxed()
        });
        self.feed.subscribe(filter, callback, None).await
    }

    /// Start auto-copying the resolved target wallets.
    pub async fn start_auto_copy(&self, config: CopyConfig) -> Result<CopySession> {
        self.start_auto_copy_with(config, None).await
    }

    /// Start auto-copying; execution failures and stream errors are also
    /// reported through `on_error`.
    ///
    /// Fails synchronously, before any subscription exists, when the
    /// configuration is unusable or no target address can be resolved.
    pub async fn start_auto_copy_with(
        &self,
        config: CopyConfig,
        on_error: Option<ErrorCallback>,
    ) -> Result<CopySession> {
        config.validate()?;

        let explicit: HashSet<String> = config
            .addresses
            .iter()
            .map(|a| a.to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();

        let mut targets = explicit.clone();
        if config.top_traders > 0 {
            let cohort = self.cohort.get_cohort(config.top_traders).await?;
            targets.extend(cohort.into_iter().map(|w| w.address));
        }

        if targets.is_empty() {
            anyhow::bail!(
                "No target addresses resolved; provide addresses or raise top_traders"
            );
        }

        let mut target_addresses: Vec<String> = targets.into_iter().collect();
        target_addresses.sort();

        let id = Uuid::new_v4();
        let stats = Arc::new(RwLock::new(SessionStats::default()));
        let dispatcher = Arc::new(Dispatcher::new(self.backend.clone(), config.dry_run));
        let filter = TradeFilter::for_addresses(&target_addresses);

        let ctx = Arc::new(TradeContext {
            config,
            dispatcher,
            stats: stats.clone(),
            cohort: self.cohort.clone(),
            explicit,
            on_error: on_error.clone(),
        });

        let callback: TradeCallback = Arc::new(move |trade: ObservedTrade| {
            let ctx = ctx.clone();
            async move {
                handle_trade(trade, ctx).await;
            }
            .boxed()
        });

        let subscription = self.feed.subscribe(filter, callback, on_error).await;

        info!(
            id = %id,
            targets = target_addresses.len(),
            "Auto-copy session started"
        );

        Ok(CopySession::new(id, target_addresses, stats, subscription))
    }
}

/// Everything one per-trade task needs, shared across the session.
struct TradeContext {
    config: CopyConfig,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<RwLock<SessionStats>>,
    cohort: Arc<CohortTracker>,
    /// Addresses the caller named directly; exempt from the post-delay
    /// cohort re-check.
    explicit: HashSet<String>,
    on_error: Option<ErrorCallback>,
}

/// Process one qualifying source trade to its terminal outcome.
///
/// Runs as its own task; several may be in flight at once and complete
/// out of order. Exactly one terminal counter moves per call.
async fn handle_trade(trade: ObservedTrade, ctx: Arc<TradeContext>) {
    ctx.stats.write().await.record_detected();

    info!(
        trader = %trade.trader_address,
        market = %trade.market_id,
        side = trade.side.as_str(),
        size = %trade.size,
        price = %trade.price,
        "Source trade detected"
    );

    let replica = match sizing::size_replica(&trade, &ctx.config) {
        Ok(replica) => replica,
        Err(reason) => {
            skip(&ctx, &trade, reason).await;
            return;
        }
    };

    if ctx.config.copy_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(ctx.config.copy_delay_ms)).await;

        // The cohort may have refreshed while we slept; a trader we only
        // follow through the cohort must still be a member.
        if !ctx.explicit.contains(&trade.trader_address) {
            let (member, _) = ctx.cohort.cached_member(&trade.trader_address).await;
            if !member {
                skip(&ctx, &trade, SkipReason::LeftCohort).await;
                return;
            }
        }
    }

    let intent = match sizing::build_intent(&trade, replica, &ctx.config) {
        Ok(intent) => intent,
        Err(reason) => {
            skip(&ctx, &trade, reason).await;
            return;
        }
    };

    match ctx.dispatcher.dispatch(&intent).await {
        ExecutionOutcome::Executed { order_id } => {
            info!(
                order_id = ?order_id,
                trader = %trade.trader_address,
                notional = %intent.notional,
                limit = %intent.limit_price,
                "Copy trade executed"
            );
            ctx.stats.write().await.record_executed(intent.notional);
        }
        ExecutionOutcome::Failed { reason } => {
            warn!(
                reason = %reason,
                trader = %trade.trader_address,
                market = %trade.market_id,
                "Copy trade failed"
            );
            ctx.stats.write().await.record_failure();
            if let Some(on_error) = &ctx.on_error {
                on_error(reason);
            }
        }
    }
}

async fn skip(ctx: &TradeContext, trade: &ObservedTrade, reason: SkipReason) {
    debug!(
        trader = %trade.trader_address,
        market = %trade.market_id,
        reason = %reason,
        "Copy skipped"
    );
    ctx.stats.write().await.record_skip();
}

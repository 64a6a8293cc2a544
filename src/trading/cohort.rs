//! Smart-money cohort cache with TTL-based invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::api::{LeaderboardEntry, LeaderboardProvider};
use crate::models::{quality_score, RankedWallet};

use super::config::CohortConfig;

/// In-memory cohort snapshot. Replaced wholesale on refresh, never
/// patched.
#[derive(Default)]
struct CohortState {
    wallets: HashMap<String, RankedWallet>,
    members: HashSet<String>,
    /// Provider order, already filtered by the PnL threshold
    ranked: Vec<RankedWallet>,
    refreshed_at: Option<Instant>,
}

impl CohortState {
    fn is_valid(&self, ttl: std::time::Duration) -> bool {
        !self.wallets.is_empty()
            && self
                .refreshed_at
                .map(|at| at.elapsed() < ttl)
                .unwrap_or(false)
    }
}

/// Tracks which wallets currently count as smart money.
///
/// Reads within the TTL are served from memory with no provider call.
/// A stale cache is repopulated in full before being queried; a failed
/// refresh keeps the previous snapshot in place rather than clearing it.
pub struct CohortTracker {
    provider: Arc<dyn LeaderboardProvider>,
    config: CohortConfig,
    state: Arc<RwLock<CohortState>>,
}

impl CohortTracker {
    pub fn new(provider: Arc<dyn LeaderboardProvider>, config: CohortConfig) -> Self {
        Self {
            provider,
            config,
            state: Arc::new(RwLock::new(CohortState::default())),
        }
    }

    /// Get up to `limit` cohort wallets in the provider's order.
    ///
    /// Serves the cached view when fresh; otherwise performs exactly one
    /// refresh before answering.
    pub async fn get_cohort(&self, limit: usize) -> Result<Vec<RankedWallet>> {
        {
            let state = self.state.read().await;
            if state.is_valid(self.config.ttl) {
                return Ok(state.ranked.iter().take(limit).cloned().collect());
            }
        }

        self.refresh(limit).await?;

        let state = self.state.read().await;
        Ok(state.ranked.iter().take(limit).cloned().collect())
    }

    /// Whether `address` is currently a cohort member, refreshing a
    /// stale cache first.
    pub async fn is_smart_money(&self, address: &str) -> Result<bool> {
        self.ensure_fresh().await?;
        let state = self.state.read().await;
        Ok(state.members.contains(&address.to_lowercase()))
    }

    /// Cohort snapshot for `address`, refreshing a stale cache first.
    pub async fn wallet_info(&self, address: &str) -> Result<Option<RankedWallet>> {
        self.ensure_fresh().await?;
        let state = self.state.read().await;
        Ok(state.wallets.get(&address.to_lowercase()).cloned())
    }

    /// Membership lookup against the cache as it stands; never refreshes.
    ///
    /// The filter pipeline runs per stream event and must not block the
    /// stream on provider I/O.
    pub async fn cached_member(&self, address: &str) -> (bool, Option<RankedWallet>) {
        let key = address.to_lowercase();
        let state = self.state.read().await;
        (
            state.members.contains(&key),
            state.wallets.get(&key).cloned(),
        )
    }

    async fn ensure_fresh(&self) -> Result<()> {
        let stale = {
            let state = self.state.read().await;
            !state.is_valid(self.config.ttl)
        };
        if stale {
            self.refresh(self.config.refresh_limit).await?;
        }
        Ok(())
    }

    /// Fetch `limit` leaderboard entries and replace the cache wholesale.
    ///
    /// On provider failure the previous snapshot is kept (stale but
    /// available); only an empty cache propagates the error.
    async fn refresh(&self, limit: usize) -> Result<()> {
        let entries = match self.provider.fetch_top_wallets(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                let state = self.state.read().await;
                if state.wallets.is_empty() {
                    return Err(e).context("Cohort refresh failed with no cached data");
                }
                warn!(error = %e, "Leaderboard refresh failed, serving stale cohort");
                return Ok(());
            }
        };

        let ranked: Vec<RankedWallet> = entries
            .into_iter()
            .filter(|e| e.pnl >= self.config.min_pnl)
            .map(to_ranked_wallet)
            .collect();

        let mut state = self.state.write().await;
        state.wallets = ranked
            .iter()
            .map(|w| (w.address.clone(), w.clone()))
            .collect();
        state.members = ranked.iter().map(|w| w.address.clone()).collect();
        state.ranked = ranked;
        state.refreshed_at = Some(Instant::now());

        info!(count = state.ranked.len(), "Cohort cache refreshed");
        Ok(())
    }
}

fn to_ranked_wallet(entry: LeaderboardEntry) -> RankedWallet {
    RankedWallet {
        address: entry.proxy_wallet.to_lowercase(),
        name: Some(entry.user_name).filter(|n| !n.is_empty()),
        pnl: entry.pnl,
        volume: entry.vol,
        score: quality_score(entry.pnl, entry.vol),
        rank: entry.rank.as_deref().and_then(|r| r.parse().ok()),
    }
}

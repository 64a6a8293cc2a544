//! Copy-trading configuration.

use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{FillMode, TradeSide};

/// Configuration for one auto-copy session, resolved once at start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Explicit wallet addresses to copy
    pub addresses: Vec<String>,

    /// Number of top cohort wallets to union into the target set
    pub top_traders: usize,

    /// Fraction of the source trade size to replicate
    pub size_scale: Decimal,

    /// Maximum notional per replicated trade in USDC
    pub max_size_per_trade: Decimal,

    /// Maximum acceptable slippage versus the observed price (0.0 to 1.0)
    pub max_slippage: Decimal,

    /// All-or-nothing vs partial-fill order placement
    pub fill_mode: FillMode,

    /// Delay between detection and replication, in milliseconds
    pub copy_delay_ms: u64,

    /// Minimum source-trade notional to react to, in USDC
    pub min_trade_size: Decimal,

    /// Only copy trades on this side, if set
    pub side_filter: Option<TradeSide>,

    /// Exchange minimum order size in USDC
    pub min_order_size: Decimal,

    /// Simulate execution instead of calling the backend
    pub dry_run: bool,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            top_traders: 5,
            size_scale: dec!(0.10),        // Copy 10% of source size
            max_size_per_trade: dec!(100), // Max $100 per replica
            max_slippage: dec!(0.03),      // 3% slippage bound
            fill_mode: FillMode::FillOrKill,
            copy_delay_ms: 0,
            min_trade_size: dec!(10),      // Ignore sub-$10 source trades
            side_filter: None,
            min_order_size: dec!(1),       // Exchange floor: $1
            dry_run: true,
        }
    }
}

impl CopyConfig {
    /// Reject configurations the sizing math cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.size_scale <= Decimal::ZERO {
            anyhow::bail!("size_scale must be positive, got {}", self.size_scale);
        }
        if self.max_slippage < Decimal::ZERO || self.max_slippage >= Decimal::ONE {
            anyhow::bail!(
                "max_slippage must be within [0, 1), got {}",
                self.max_slippage
            );
        }
        if self.max_size_per_trade <= Decimal::ZERO {
            anyhow::bail!(
                "max_size_per_trade must be positive, got {}",
                self.max_size_per_trade
            );
        }
        Ok(())
    }
}

/// Configuration for the smart-money cohort cache.
#[derive(Debug, Clone)]
pub struct CohortConfig {
    /// Minimum realized PnL in USDC for cohort admission
    pub min_pnl: f64,

    /// How long a refreshed cohort stays valid
    pub ttl: Duration,

    /// Leaderboard entries fetched when a membership lookup forces a refresh
    pub refresh_limit: usize,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            min_pnl: 500.0,
            ttl: Duration::from_secs(300),
            refresh_limit: 50,
        }
    }
}

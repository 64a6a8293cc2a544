//! Ranked wallet model for leaderboard-sourced smart-money traders.

use serde::{Deserialize, Serialize};

/// A wallet ranked by the leaderboard provider and admitted to the
/// smart-money cohort.
///
/// Produced wholesale by a cohort refresh; a wallet that falls off the
/// leaderboard disappears on the next refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedWallet {
    /// Wallet address (canonical lower-case, 0x-prefixed)
    pub address: String,

    /// Display name / pseudonym, if the provider reports one
    pub name: Option<String>,

    /// Realized profit-and-loss in USDC
    pub pnl: f64,

    /// Traded volume in USDC
    pub volume: f64,

    /// Derived quality score (0-100)
    pub score: u8,

    /// Leaderboard rank, if reported
    pub rank: Option<u32>,
}

impl RankedWallet {
    /// Get display name (pseudonym or truncated address).
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            name.to_string()
        } else if self.address.len() > 10 {
            format!(
                "{}...{}",
                &self.address[..6],
                &self.address[self.address.len() - 4..]
            )
        } else {
            self.address.clone()
        }
    }
}

/// Quality score for a wallet: 50 points for PnL (full marks at $100k),
/// 50 points for volume (full marks at $1M), capped at 100.
pub fn quality_score(pnl: f64, volume: f64) -> u8 {
    let raw = pnl / 100_000.0 * 50.0 + volume / 1_000_000.0 * 50.0;
    raw.round().clamp(0.0, 100.0) as u8
}

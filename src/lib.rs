//! Smart-money copy-trading engine for prediction markets.
//!
//! Ranks wallets from the exchange leaderboard into a smart-money
//! cohort, follows a live trade stream through a shared subscription,
//! and replicates qualifying trades under strict risk bounds.

pub mod api;
pub mod models;
pub mod trading;

#[cfg(test)]
pub(crate) mod testutil;

pub use trading::{CohortConfig, CopyConfig, CopyEngine, CopySession, SessionStats, TradeFilter};

//! Data models for wallets, trades, and replica orders.

mod order;
mod trade;
mod wallet;

pub use order::{FillMode, OrderIntent};
pub use trade::{ObservedTrade, TradeEvent, TradeSide};
pub use wallet::{quality_score, RankedWallet};

//! Replica order intent produced by the sizing step.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::trade::TradeSide;

/// How a replica order may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillMode {
    /// Fill the whole order immediately or cancel it
    FillOrKill,
    /// Fill whatever is immediately available, cancel the remainder
    Partial,
}

impl FillMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillMode::FillOrKill => "FOK",
            FillMode::Partial => "FAK",
        }
    }
}

/// A fully specified replica order, ready for dispatch.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    /// Outcome token to trade
    pub asset_id: String,

    /// Order direction (same as the source trade)
    pub side: TradeSide,

    /// USDC amount to commit
    pub notional: Decimal,

    /// Worst acceptable execution price
    pub limit_price: Decimal,

    /// Fill behavior requested from the exchange
    pub fill_mode: FillMode,
}

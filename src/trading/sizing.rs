//! Replica order sizing: scale, clamp, floor, and slippage-bounded pricing.

use std::fmt;

use rust_decimal::Decimal;

use crate::models::{ObservedTrade, OrderIntent, TradeSide};

use super::config::CopyConfig;

/// Why a detected trade was not replicated. A skip is a normal outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source notional below the configured reaction threshold
    BelowMinTradeSize,
    /// Side filter excluded the trade
    SideFiltered,
    /// Clamped notional below the exchange minimum order size
    BelowExchangeMinimum,
    /// Event carried no tradable asset identifier
    MissingAssetId,
    /// Trader left the cohort while the copy was delayed
    LeftCohort,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::BelowMinTradeSize => "source notional below minimum",
            SkipReason::SideFiltered => "side excluded by filter",
            SkipReason::BelowExchangeMinimum => "below exchange minimum order size",
            SkipReason::MissingAssetId => "no tradable asset id",
            SkipReason::LeftCohort => "trader left cohort during delay",
        };
        f.write_str(s)
    }
}

/// A replica sized against the source trade, not yet priced.
#[derive(Debug, Clone, Copy)]
pub struct SizedReplica {
    /// Outcome tokens to buy or sell
    pub size: Decimal,
    /// USDC value at the source price
    pub notional: Decimal,
}

/// Size a replica of `trade` under `config`, or decide to skip.
///
/// The replica notional never exceeds `max_size_per_trade`.
pub fn size_replica(trade: &ObservedTrade, config: &CopyConfig) -> Result<SizedReplica, SkipReason> {
    if trade.notional() < config.min_trade_size {
        return Err(SkipReason::BelowMinTradeSize);
    }

    if let Some(side) = config.side_filter {
        if trade.side != side {
            return Err(SkipReason::SideFiltered);
        }
    }

    let mut size = trade.size * config.size_scale;
    let mut notional = size * trade.price;

    if notional > config.max_size_per_trade {
        size = config.max_size_per_trade / trade.price;
        notional = config.max_size_per_trade;
    }

    if notional < config.min_order_size {
        return Err(SkipReason::BelowExchangeMinimum);
    }

    Ok(SizedReplica { size, notional })
}

/// Worst acceptable execution price versus the observed source price.
pub fn limit_price(side: TradeSide, price: Decimal, max_slippage: Decimal) -> Decimal {
    match side {
        TradeSide::Buy => price * (Decimal::ONE + max_slippage),
        TradeSide::Sell => price * (Decimal::ONE - max_slippage),
    }
}

/// Turn a sized replica into a dispatchable order intent.
pub fn build_intent(
    trade: &ObservedTrade,
    replica: SizedReplica,
    config: &CopyConfig,
) -> Result<OrderIntent, SkipReason> {
    let asset_id = trade
        .asset_id
        .clone()
        .filter(|a| !a.is_empty())
        .ok_or(SkipReason::MissingAssetId)?;

    Ok(OrderIntent {
        asset_id,
        side: trade.side,
        notional: replica.notional,
        limit_price: limit_price(trade.side, trade.price, config.max_slippage),
        fill_mode: config.fill_mode,
    })
}

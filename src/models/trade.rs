//! Trade models: raw stream events and normalized observed trades.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wallet::RankedWallet;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }

    /// Parse the side string the exchange APIs report.
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" => Some(TradeSide::Buy),
            "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

/// A raw fill as emitted by the trade stream, before filtering.
///
/// Fields the stream could not resolve stay `None`; the filter pipeline
/// decides whether the event is usable.
#[derive(Debug, Clone)]
pub struct TradeEvent {
    /// Trader's wallet address, if the event resolved one
    pub trader_address: Option<String>,

    /// Trader's display name, if known
    pub trader_name: Option<String>,

    /// Market condition ID (0x-prefixed)
    pub market_id: String,

    /// Trade direction
    pub side: TradeSide,

    /// Number of outcome tokens traded
    pub size: Decimal,

    /// Price per token in USDC (0.0 to 1.0)
    pub price: Decimal,

    /// Tradable asset (outcome token) identifier, if resolved
    pub asset_id: Option<String>,

    /// Outcome being traded (e.g. "Yes", "No")
    pub outcome: String,

    /// On-chain transaction hash
    pub transaction_hash: String,

    /// When the fill occurred
    pub timestamp: DateTime<Utc>,
}

impl TradeEvent {
    /// Total USDC value of the fill.
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }
}

/// A normalized trade that passed a listener's filter chain.
///
/// Created per incoming stream event, consumed once by each registered
/// listener; never persisted.
#[derive(Debug, Clone)]
pub struct ObservedTrade {
    /// Trader's wallet address (lower-cased)
    pub trader_address: String,

    /// Trader's display name, if known
    pub trader_name: Option<String>,

    /// Market condition ID
    pub market_id: String,

    /// Trade direction
    pub side: TradeSide,

    /// Number of outcome tokens traded
    pub size: Decimal,

    /// Price per token in USDC
    pub price: Decimal,

    /// Tradable asset identifier, if resolved
    pub asset_id: Option<String>,

    /// Outcome being traded
    pub outcome: String,

    /// On-chain transaction hash
    pub transaction_hash: String,

    /// When the fill occurred
    pub timestamp: DateTime<Utc>,

    /// Whether the trader is a current cohort member
    pub smart_money: bool,

    /// Cohort snapshot for the trader, when a member
    pub wallet: Option<RankedWallet>,
}

impl ObservedTrade {
    /// Total USDC value of the source trade.
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_parsing() {
        assert_eq!(TradeSide::from_api_str("BUY"), Some(TradeSide::Buy));
        assert_eq!(TradeSide::from_api_str("sell"), Some(TradeSide::Sell));
        assert_eq!(TradeSide::from_api_str("HOLD"), None);
    }

    #[test]
    fn test_notional() {
        let event = TradeEvent {
            trader_address: Some("0xabc".to_string()),
            trader_name: None,
            market_id: "0xmarket".to_string(),
            side: TradeSide::Buy,
            size: dec!(100),
            price: dec!(0.5),
            asset_id: Some("123".to_string()),
            outcome: "Yes".to_string(),
            transaction_hash: "0xtx".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.notional(), dec!(50));
    }
}

//! Per-listener trade filtering and normalization.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::models::{ObservedTrade, TradeEvent};

use super::cohort::CohortTracker;

/// Predicate chain one listener applies to every stream event.
///
/// Rules run in order and short-circuit on the first failure; a dropped
/// event produces nothing.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    /// Only pass trades from these addresses; empty means any trader.
    /// Stored lower-cased, matched case-insensitively.
    pub addresses: HashSet<String>,

    /// Minimum trade size in outcome tokens
    pub min_size: Option<Decimal>,

    /// Only pass trades from current cohort members
    pub smart_money_only: bool,
}

impl TradeFilter {
    /// Filter restricted to the given addresses.
    pub fn for_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            addresses: addresses
                .into_iter()
                .map(|a| a.as_ref().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_min_size(mut self, min_size: Decimal) -> Self {
        self.min_size = Some(min_size);
        self
    }

    pub fn smart_money_only(mut self) -> Self {
        self.smart_money_only = true;
        self
    }

    /// Apply the chain to one raw event.
    ///
    /// Cohort membership is looked up against the cache as it stands;
    /// this path never triggers a refresh.
    pub async fn apply(&self, event: &TradeEvent, cohort: &CohortTracker) -> Option<ObservedTrade> {
        let address = event
            .trader_address
            .as_deref()
            .filter(|a| !a.is_empty())?
            .to_lowercase();

        if !self.addresses.is_empty() && !self.addresses.contains(&address) {
            return None;
        }

        if let Some(min_size) = self.min_size {
            if event.size < min_size {
                return None;
            }
        }

        let (smart_money, wallet) = cohort.cached_member(&address).await;
        if self.smart_money_only && !smart_money {
            return None;
        }

        Some(ObservedTrade {
            trader_address: address,
            trader_name: event.trader_name.clone(),
            market_id: event.market_id.clone(),
            side: event.side,
            size: event.size,
            price: event.price,
            asset_id: event.asset_id.clone(),
            outcome: event.outcome.clone(),
            transaction_hash: event.transaction_hash.clone(),
            timestamp: event.timestamp,
            smart_money,
            wallet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{entry, sample_event, StaticLeaderboard};
    use crate::trading::config::CohortConfig;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn empty_cohort() -> CohortTracker {
        CohortTracker::new(
            Arc::new(StaticLeaderboard::new(vec![])),
            CohortConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_drops_events_without_trader() {
        let cohort = empty_cohort();
        let mut event = sample_event("0xAAA", dec!(100), dec!(0.5));
        event.trader_address = None;

        let filter = TradeFilter::default();
        assert!(filter.apply(&event, &cohort).await.is_none());
    }

    #[tokio::test]
    async fn test_address_filter_is_case_insensitive() {
        let cohort = empty_cohort();
        let filter = TradeFilter::for_addresses(["0xAAA"]);

        let pass = sample_event("0xaAa", dec!(100), dec!(0.5));
        assert!(filter.apply(&pass, &cohort).await.is_some());

        let drop = sample_event("0xbbb", dec!(100), dec!(0.5));
        assert!(filter.apply(&drop, &cohort).await.is_none());
    }

    #[tokio::test]
    async fn test_min_size_gate() {
        let cohort = empty_cohort();
        let filter = TradeFilter::default().with_min_size(dec!(50));

        let small = sample_event("0xAAA", dec!(49), dec!(0.5));
        assert!(filter.apply(&small, &cohort).await.is_none());

        let exact = sample_event("0xAAA", dec!(50), dec!(0.5));
        assert!(filter.apply(&exact, &cohort).await.is_some());
    }

    #[tokio::test]
    async fn test_smart_money_only_requires_membership() {
        let provider = Arc::new(StaticLeaderboard::new(vec![entry(
            "0xAAA", 10_000.0, 50_000.0,
        )]));
        let cohort = CohortTracker::new(provider, CohortConfig::default());
        // Populate the cache; the filter itself never refreshes
        cohort.get_cohort(10).await.unwrap();

        let filter = TradeFilter::default().smart_money_only();

        let member = sample_event("0xAAA", dec!(100), dec!(0.5));
        let observed = filter.apply(&member, &cohort).await.unwrap();
        assert!(observed.smart_money);
        assert_eq!(observed.wallet.unwrap().address, "0xaaa");

        let outsider = sample_event("0xBBB", dec!(100), dec!(0.5));
        assert!(filter.apply(&outsider, &cohort).await.is_none());
    }

    #[tokio::test]
    async fn test_membership_flag_attached_without_gate() {
        let provider = Arc::new(StaticLeaderboard::new(vec![entry(
            "0xAAA", 10_000.0, 50_000.0,
        )]));
        let cohort = CohortTracker::new(provider, CohortConfig::default());
        cohort.get_cohort(10).await.unwrap();

        let filter = TradeFilter::default();
        let outsider = sample_event("0xBBB", dec!(100), dec!(0.5));
        let observed = filter.apply(&outsider, &cohort).await.unwrap();
        assert!(!observed.smart_money);
        assert!(observed.wallet.is_none());
    }
}

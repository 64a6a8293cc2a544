//! Trading logic: cohort selection, stream fan-out, sizing, execution.

mod cohort;
mod config;
mod engine;
mod executor;
mod feed;
mod filter;
mod session;
mod sizing;

pub use cohort::CohortTracker;
pub use config::{CohortConfig, CopyConfig};
pub use engine::CopyEngine;
pub use executor::{Dispatcher, ExecutionOutcome};
pub use feed::{ErrorCallback, Subscription, TradeCallback, TradeFeed};
pub use filter::TradeFilter;
pub use session::{CopySession, SessionStats};
pub use sizing::{build_intent, limit_price, size_replica, SizedReplica, SkipReason};

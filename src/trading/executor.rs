//! Order dispatch: dry-run simulation or live backend submission.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::api::ExecutionBackend;
use crate::models::OrderIntent;

/// Terminal classification of one dispatch attempt.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Executed { order_id: Option<String> },
    Failed { reason: String },
}

/// Submits replica orders, or simulates them in dry-run mode.
///
/// Every failure mode of the backend is absorbed here; the per-trade
/// handler serving the shared stream never sees an `Err`.
pub struct Dispatcher {
    backend: Arc<dyn ExecutionBackend>,
    dry_run: bool,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn ExecutionBackend>, dry_run: bool) -> Self {
        Self { backend, dry_run }
    }

    pub async fn dispatch(&self, intent: &OrderIntent) -> ExecutionOutcome {
        if self.dry_run {
            info!(
                asset = %intent.asset_id,
                side = intent.side.as_str(),
                notional = %intent.notional,
                limit = %intent.limit_price,
                "[DRY RUN] Would submit order"
            );
            return ExecutionOutcome::Executed {
                order_id: Some(format!("dry-{}", Uuid::new_v4())),
            };
        }

        match self.backend.submit_order(intent).await {
            Ok(response) if response.success => {
                info!(
                    order_id = ?response.order_id,
                    asset = %intent.asset_id,
                    notional = %intent.notional,
                    "Order submitted"
                );
                ExecutionOutcome::Executed {
                    order_id: response.order_id,
                }
            }
            Ok(response) => {
                let reason = if response.error_msg.is_empty() {
                    "order rejected".to_string()
                } else {
                    response.error_msg
                };
                warn!(reason = %reason, asset = %intent.asset_id, "Order rejected");
                ExecutionOutcome::Failed { reason }
            }
            Err(e) => {
                warn!(error = %e, asset = %intent.asset_id, "Order submission failed");
                ExecutionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FillMode, TradeSide};
    use crate::testutil::RecordingBackend;
    use rust_decimal_macros::dec;
    use std::sync::atomic::Ordering;

    fn intent() -> OrderIntent {
        OrderIntent {
            asset_id: "1234".to_string(),
            side: TradeSide::Buy,
            notional: dec!(5),
            limit_price: dec!(0.515),
            fill_mode: FillMode::FillOrKill,
        }
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_backend() {
        let backend = Arc::new(RecordingBackend::succeeding());
        let dispatcher = Dispatcher::new(backend.clone(), true);

        let outcome = dispatcher.dispatch(&intent()).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Executed { order_id: Some(ref id) } if id.starts_with("dry-")
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_success_is_executed() {
        let backend = Arc::new(RecordingBackend::succeeding());
        let dispatcher = Dispatcher::new(backend.clone(), false);

        let outcome = dispatcher.dispatch(&intent()).await;
        assert!(matches!(outcome, ExecutionOutcome::Executed { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_classified_failed() {
        let backend = Arc::new(RecordingBackend::rejecting("insufficient balance"));
        let dispatcher = Dispatcher::new(backend, false);

        let outcome = dispatcher.dispatch(&intent()).await;
        match outcome {
            ExecutionOutcome::Failed { reason } => {
                assert_eq!(reason, "insufficient balance");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_contained() {
        let backend = Arc::new(RecordingBackend::erroring());
        let dispatcher = Dispatcher::new(backend.clone(), false);

        let outcome = dispatcher.dispatch(&intent()).await;
        assert!(matches!(outcome, ExecutionOutcome::Failed { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}

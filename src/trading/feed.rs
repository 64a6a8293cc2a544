//! Shared trade-stream subscription with per-listener fan-out.
//!
//! However many listeners register, exactly one upstream source task
//! runs. The last listener to unsubscribe tears the upstream down; the
//! next subscriber brings it back up.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{SourceMessage, TradeSource};
use crate::models::ObservedTrade;

use super::cohort::CohortTracker;
use super::filter::TradeFilter;

/// Async per-trade callback.
pub type TradeCallback = Arc<dyn Fn(ObservedTrade) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback for transient stream or execution errors.
pub type ErrorCallback = Arc<dyn Fn(String) + Send + Sync>;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
struct Listener {
    filter: TradeFilter,
    on_trade: TradeCallback,
    on_error: Option<ErrorCallback>,
}

#[derive(Default)]
struct FeedInner {
    listeners: HashMap<u64, Listener>,
    upstream: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

/// Fan-out hub between one trade source and any number of listeners.
pub struct TradeFeed {
    source: Arc<dyn TradeSource>,
    cohort: Arc<CohortTracker>,
    inner: Arc<Mutex<FeedInner>>,
    next_id: AtomicU64,
}

impl TradeFeed {
    pub fn new(source: Arc<dyn TradeSource>, cohort: Arc<CohortTracker>) -> Self {
        Self {
            source,
            cohort,
            inner: Arc::new(Mutex::new(FeedInner::default())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener; starts the upstream subscription if this is
    /// the first one.
    pub async fn subscribe(
        &self,
        filter: TradeFilter,
        on_trade: TradeCallback,
        on_error: Option<ErrorCallback>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().await;
        inner.listeners.insert(
            id,
            Listener {
                filter,
                on_trade,
                on_error,
            },
        );

        if inner.upstream.is_none() {
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            let source = self.source.clone();
            inner.upstream = Some(tokio::spawn(async move {
                source.stream(tx).await;
            }));
            inner.pump = Some(tokio::spawn(Self::pump(
                rx,
                self.inner.clone(),
                self.cohort.clone(),
            )));
            debug!("Upstream trade subscription started");
        }

        Subscription {
            id,
            inner: self.inner.clone(),
            unsubscribed: AtomicBool::new(false),
        }
    }

    /// Number of currently registered listeners.
    pub async fn listener_count(&self) -> usize {
        self.inner.lock().await.listeners.len()
    }

    /// Dispatch loop: the single reader of the source channel, so events
    /// reach the filters in emission order.
    async fn pump(
        mut rx: mpsc::Receiver<SourceMessage>,
        inner: Arc<Mutex<FeedInner>>,
        cohort: Arc<CohortTracker>,
    ) {
        while let Some(message) = rx.recv().await {
            // Snapshot the registry so listener callbacks never run
            // under the lock.
            let listeners: Vec<Listener> = {
                let inner = inner.lock().await;
                inner.listeners.values().cloned().collect()
            };

            match message {
                SourceMessage::Trade(event) => {
                    for listener in listeners {
                        if let Some(trade) = listener.filter.apply(&event, &cohort).await {
                            let callback = listener.on_trade.clone();
                            // One listener's failure must not reach the
                            // others or the pump itself.
                            tokio::spawn(async move {
                                let delivery = AssertUnwindSafe(callback(trade));
                                if delivery.catch_unwind().await.is_err() {
                                    warn!("Trade listener panicked");
                                }
                            });
                        }
                    }
                }
                SourceMessage::Error(error) => {
                    warn!(error = %error, "Trade source error");
                    for listener in listeners {
                        if let Some(on_error) = &listener.on_error {
                            on_error(error.clone());
                        }
                    }
                }
            }
        }
    }
}

/// Handle for one registered listener.
pub struct Subscription {
    id: u64,
    inner: Arc<Mutex<FeedInner>>,
    unsubscribed: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener; tears down the upstream subscription when no
    /// listener remains. Safe to call more than once.
    pub async fn unsubscribe(&self) {
        if self.unsubscribed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut inner = self.inner.lock().await;
        inner.listeners.remove(&self.id);

        if inner.listeners.is_empty() {
            if let Some(handle) = inner.upstream.take() {
                handle.abort();
            }
            if let Some(handle) = inner.pump.take() {
                handle.abort();
            }
            debug!("Last listener removed, upstream subscription closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_event, wait_until, ScriptedSource, StaticLeaderboard};
    use crate::trading::config::CohortConfig;
    use futures::FutureExt;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    fn feed_with_events(events: Vec<crate::models::TradeEvent>) -> TradeFeed {
        let cohort = Arc::new(CohortTracker::new(
            Arc::new(StaticLeaderboard::new(vec![])),
            CohortConfig::default(),
        ));
        TradeFeed::new(Arc::new(ScriptedSource::new(events)), cohort)
    }

    fn counting_callback(counter: Arc<AtomicUsize>) -> TradeCallback {
        Arc::new(move |_trade: ObservedTrade| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_every_listener_sees_each_event() {
        let feed = feed_with_events(vec![
            sample_event("0xAAA", dec!(100), dec!(0.5)),
            sample_event("0xBBB", dec!(200), dec!(0.4)),
        ]);

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let _a = feed
            .subscribe(TradeFilter::default(), counting_callback(first.clone()), None)
            .await;
        let _b = feed
            .subscribe(TradeFilter::default(), counting_callback(second.clone()), None)
            .await;

        wait_until(|| first.load(Ordering::SeqCst) == 2 && second.load(Ordering::SeqCst) == 2)
            .await;
    }

    #[tokio::test]
    async fn test_filter_applies_per_listener() {
        let feed = feed_with_events(vec![
            sample_event("0xAAA", dec!(100), dec!(0.5)),
            sample_event("0xBBB", dec!(200), dec!(0.4)),
        ]);

        let narrow = Arc::new(AtomicUsize::new(0));
        let wide = Arc::new(AtomicUsize::new(0));
        let _a = feed
            .subscribe(
                TradeFilter::for_addresses(["0xAAA"]),
                counting_callback(narrow.clone()),
                None,
            )
            .await;
        let _b = feed
            .subscribe(TradeFilter::default(), counting_callback(wide.clone()), None)
            .await;

        wait_until(|| wide.load(Ordering::SeqCst) == 2).await;
        assert_eq!(narrow.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_starve_others() {
        let feed = feed_with_events(vec![
            sample_event("0xAAA", dec!(100), dec!(0.5)),
            sample_event("0xBBB", dec!(200), dec!(0.4)),
        ]);

        let survivor = Arc::new(AtomicUsize::new(0));
        let _bad = feed
            .subscribe(
                TradeFilter::default(),
                Arc::new(|_trade: ObservedTrade| async { panic!("listener bug") }.boxed()),
                None,
            )
            .await;
        let _good = feed
            .subscribe(TradeFilter::default(), counting_callback(survivor.clone()), None)
            .await;

        wait_until(|| survivor.load(Ordering::SeqCst) == 2).await;
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_tears_down() {
        let feed = feed_with_events(vec![]);

        let calls = Arc::new(AtomicUsize::new(0));
        let sub = feed
            .subscribe(TradeFilter::default(), counting_callback(calls.clone()), None)
            .await;
        assert_eq!(feed.listener_count().await, 1);

        sub.unsubscribe().await;
        sub.unsubscribe().await;
        assert_eq!(feed.listener_count().await, 0);

        // Upstream handles were taken down with the last listener
        let inner = feed.inner.lock().await;
        assert!(inner.upstream.is_none());
        assert!(inner.pump.is_none());
    }

    #[tokio::test]
    async fn test_stream_errors_reach_error_callbacks() {
        let cohort = Arc::new(CohortTracker::new(
            Arc::new(StaticLeaderboard::new(vec![])),
            CohortConfig::default(),
        ));
        let source = ScriptedSource::new(vec![]).with_errors(vec!["poll failed".to_string()]);
        let feed = TradeFeed::new(Arc::new(source), cohort);

        let errors = Arc::new(AtomicUsize::new(0));
        let errors_cb = errors.clone();
        let _sub = feed
            .subscribe(
                TradeFilter::default(),
                Arc::new(|_trade: ObservedTrade| async {}.boxed()),
                Some(Arc::new(move |_e: String| {
                    errors_cb.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .await;

        wait_until(|| errors.load(Ordering::SeqCst) == 1).await;
    }
}

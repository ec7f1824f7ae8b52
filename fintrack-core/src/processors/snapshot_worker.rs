//! Snapshot consumer worker.
//!
//! Pulls snapshot messages off the channel, recomputes the owner's stats
//! and overwrites the cache. A failed message goes back on the queue with
//! a capped exponential backoff, which is what makes handling
//! at-least-once; handlers are overwrite-only, so running the same message
//! twice is harmless. Several workers may share one queue; per-owner
//! handling is not serialized across them.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cache::CacheError;
use crate::events::{ChannelError, SnapshotMessage, SnapshotQueueReceiver};
use crate::services::AnalyticsService;

/// Maximum backoff exponent (2^6 = 64 seconds between redeliveries).
const MAX_BACKOFF_EXPONENT: u32 = 6;

#[derive(Debug, Error)]
enum SnapshotWorkerError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub struct SnapshotWorker {
    service: Arc<AnalyticsService>,
    queue: SnapshotQueueReceiver,
    shutdown_rx: watch::Receiver<bool>,
    worker_id: usize,
}

impl SnapshotWorker {
    pub fn new(
        service: Arc<AnalyticsService>,
        queue: SnapshotQueueReceiver,
        shutdown_rx: watch::Receiver<bool>,
        worker_id: usize,
    ) -> Self {
        Self {
            service,
            queue,
            shutdown_rx,
            worker_id,
        }
    }

    /// Run until shutdown is signalled or every publisher is gone.
    pub async fn run(mut self) {
        info!(worker_id = self.worker_id, "snapshot worker started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    // A dropped sender counts as shutdown too.
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!(worker_id = self.worker_id, "snapshot worker received shutdown signal");
                        break;
                    }
                }

                message = self.queue.recv() => {
                    let Some(message) = message else {
                        info!(worker_id = self.worker_id, "snapshot channel closed");
                        break;
                    };
                    self.handle_message(message).await;
                }
            }
        }

        info!(worker_id = self.worker_id, "snapshot worker shutdown complete");
    }

    async fn handle_message(&self, message: SnapshotMessage) {
        match self.process(&message).await {
            Ok(()) => {
                debug!(
                    worker_id = self.worker_id,
                    message_id = %message.message_id,
                    "snapshot applied"
                );
            }
            Err(e) => {
                warn!(
                    worker_id = self.worker_id,
                    message_id = %message.message_id,
                    attempt = message.attempt,
                    error = %e,
                    "snapshot handling failed, scheduling redelivery"
                );
                // Requeue from a separate task: waiting on our own bounded
                // queue here would block the only consumer, and a full
                // queue would then never drain.
                let queue = self.queue.clone();
                let worker_id = self.worker_id;
                tokio::spawn(async move {
                    tokio::time::sleep(redelivery_delay(message.attempt)).await;
                    if let Err(e) = queue.redeliver(message).await {
                        error!(
                            worker_id,
                            error = %e,
                            "failed to requeue snapshot, message lost"
                        );
                    }
                });
            }
        }
    }

    async fn process(&self, message: &SnapshotMessage) -> Result<(), SnapshotWorkerError> {
        let snapshot = message.decode()?;
        self.service.handle_snapshot(&snapshot).await?;
        Ok(())
    }
}

/// Delay before redelivering a failed message: 2^attempt seconds, capped.
fn redelivery_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.min(MAX_BACKOFF_EXPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStatsCache, StatsCache};
    use crate::events::snapshot_queue;
    use crate::services::read::TransactionFetcher;
    use async_trait::async_trait;
    use fintrack_sdk::client::ClientError;
    use fintrack_sdk::objects::{FinanceStats, Transaction, TransactionSnapshot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn redelivery_delay_is_capped() {
        assert_eq!(redelivery_delay(0), Duration::from_secs(1));
        assert_eq!(redelivery_delay(1), Duration::from_secs(2));
        assert_eq!(redelivery_delay(6), Duration::from_secs(64));
        assert_eq!(redelivery_delay(7), Duration::from_secs(64));
        assert_eq!(redelivery_delay(100), Duration::from_secs(64));
    }

    struct NoFetch;

    #[async_trait]
    impl TransactionFetcher for NoFetch {
        async fn list_transactions(&self, _user_id: &str) -> Result<Vec<Transaction>, ClientError> {
            Ok(vec![])
        }
    }

    /// Cache that fails its first `fail_times` sets, then delegates.
    struct FlakyCache {
        inner: MemoryStatsCache,
        remaining_failures: AtomicUsize,
    }

    #[async_trait]
    impl StatsCache for FlakyCache {
        async fn get(&self, user_id: &str) -> Result<Option<FinanceStats>, CacheError> {
            self.inner.get(user_id).await
        }

        async fn set(&self, stats: &FinanceStats) -> Result<(), CacheError> {
            if self
                .remaining_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(CacheError::Store("write timeout".to_string()));
            }
            self.inner.set(stats).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_snapshot_is_redelivered_until_it_lands() {
        let cache = Arc::new(FlakyCache {
            inner: MemoryStatsCache::new(Duration::from_secs(300)),
            remaining_failures: AtomicUsize::new(2),
        });
        let service = Arc::new(AnalyticsService::new(cache.clone(), Arc::new(NoFetch)));
        let (queue, receiver) = snapshot_queue(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = SnapshotWorker::new(service, receiver, shutdown_rx, 0);
        let handle = tokio::spawn(worker.run());

        use crate::events::SnapshotPublisher;
        queue
            .publish(&TransactionSnapshot {
                user_id: "u1".to_string(),
                transactions: vec![],
            })
            .await
            .unwrap();

        // Two failed attempts back off 1s + 2s before the third succeeds.
        let mut landed = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if cache.get("u1").await.unwrap().is_some() {
                landed = true;
                break;
            }
        }
        assert!(landed, "snapshot never reached the cache");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    /// Cache that rejects every write but records which owners were tried.
    #[derive(Default)]
    struct RejectingCache {
        attempted: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StatsCache for RejectingCache {
        async fn get(&self, _user_id: &str) -> Result<Option<FinanceStats>, CacheError> {
            Ok(None)
        }

        async fn set(&self, stats: &FinanceStats) -> Result<(), CacheError> {
            self.attempted.lock().unwrap().push(stats.user_id.clone());
            Err(CacheError::Store("write refused".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_of_failing_messages_still_delivers_later_ones() {
        let cache = Arc::new(RejectingCache::default());
        let service = Arc::new(AnalyticsService::new(cache.clone(), Arc::new(NoFetch)));
        // Buffer of one, single worker: requeueing inline here would wedge
        // the whole pipeline as soon as two messages fail back to back.
        let (queue, receiver) = snapshot_queue(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = SnapshotWorker::new(service, receiver, shutdown_rx, 0);
        let handle = tokio::spawn(worker.run());

        use crate::events::SnapshotPublisher;
        for owner in ["a", "b", "c"] {
            queue
                .publish(&TransactionSnapshot {
                    user_id: owner.to_string(),
                    transactions: vec![],
                })
                .await
                .unwrap();
        }

        let mut all_seen = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let attempted = cache.attempted.lock().unwrap();
            if ["a", "b", "c"]
                .iter()
                .all(|owner| attempted.iter().any(|seen| seen == owner))
            {
                all_seen = true;
                break;
            }
        }
        assert!(all_seen, "later messages starved behind a failing one");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn worker_stops_when_shutdown_sender_is_dropped() {
        let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(300)));
        let service = Arc::new(AnalyticsService::new(cache, Arc::new(NoFetch)));
        let (_queue, receiver) = snapshot_queue(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = SnapshotWorker::new(service, receiver, shutdown_rx, 2);
        let handle = tokio::spawn(worker.run());

        drop(shutdown_tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn worker_stops_on_shutdown_signal() {
        let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(300)));
        let service = Arc::new(AnalyticsService::new(cache, Arc::new(NoFetch)));
        let (_queue, receiver) = snapshot_queue(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = SnapshotWorker::new(service, receiver, shutdown_rx, 1);
        let handle = tokio::spawn(worker.run());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}

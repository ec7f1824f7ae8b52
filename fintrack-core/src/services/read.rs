//! Read orchestrator: cache-aside stats serving plus the event-driven
//! cache pre-warming path.

use async_trait::async_trait;
use fintrack_sdk::client::{ClientError, LedgerClient};
use fintrack_sdk::objects::{FinanceStats, Transaction, TransactionSnapshot};
use std::sync::Arc;
use thiserror::Error;

use crate::analytics::calculate_stats;
use crate::cache::{CacheError, StatsCache};

#[derive(Debug, Error)]
pub enum StatsError {
    /// The fallback fetch failed; without it there is no data to serve.
    #[error("fetch transactions from ledger: {0}")]
    Upstream(#[from] ClientError),
}

/// Remote-fetch seam for the fallback path: one operation, the owner's
/// complete transaction list.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, ClientError>;
}

#[async_trait]
impl TransactionFetcher for LedgerClient {
    async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, ClientError> {
        LedgerClient::list_transactions(self, user_id).await
    }
}

/// Serves per-owner stats, preferring the cache and recomputing from the
/// ledger on miss. Event-delivered snapshots are aggregated and cached
/// immediately, so reads typically hit.
///
/// A read-triggered and an event-triggered recompute for the same owner
/// may race; the last `set` wins, which is acceptable for a derived view.
pub struct AnalyticsService {
    cache: Arc<dyn StatsCache>,
    fetcher: Arc<dyn TransactionFetcher>,
}

impl AnalyticsService {
    pub fn new(cache: Arc<dyn StatsCache>, fetcher: Arc<dyn TransactionFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Cache-aside read path.
    ///
    /// A cache *error* (as opposed to a miss) degrades to the fallback
    /// fetch and is logged distinctly, since it signals infrastructure
    /// trouble rather than a cold key. Fails only if the fallback fetch
    /// fails too.
    pub async fn get_stats(&self, user_id: &str) -> Result<FinanceStats, StatsError> {
        match self.cache.get(user_id).await {
            Ok(Some(stats)) => {
                tracing::debug!(user_id = %user_id, "stats cache hit");
                return Ok(stats);
            }
            Ok(None) => tracing::debug!(user_id = %user_id, "stats cache miss"),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "stats cache degraded, recomputing")
            }
        }

        let transactions = self.fetcher.list_transactions(user_id).await?;
        let stats = self.aggregate(user_id, &transactions);

        if let Err(e) = self.cache.set(&stats).await {
            tracing::warn!(user_id = %user_id, error = %e, "failed to cache recomputed stats");
        }

        Ok(stats)
    }

    /// Event path: recompute and overwrite the cache for every delivered
    /// snapshot. A cache failure here is a handler error, which the
    /// channel answers with redelivery.
    pub async fn handle_snapshot(&self, snapshot: &TransactionSnapshot) -> Result<(), CacheError> {
        let stats = self.aggregate(&snapshot.user_id, &snapshot.transactions);
        self.cache.set(&stats).await?;
        tracing::debug!(
            user_id = %snapshot.user_id,
            transactions = snapshot.transactions.len(),
            "stats cache refreshed from snapshot"
        );
        Ok(())
    }

    /// An empty list carries no owner id of its own (the owner's last row
    /// may just have been deleted), so stamp the requested owner in.
    fn aggregate(&self, user_id: &str, transactions: &[Transaction]) -> FinanceStats {
        let mut stats = calculate_stats(transactions);
        if stats.user_id.is_empty() {
            stats.user_id = user_id.to_owned();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStatsCache;
    use fintrack_sdk::objects::TransactionKind;
    use fintrack_sdk::client::StatusCode;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use time::macros::datetime;

    struct FakeFetcher {
        transactions: Vec<Transaction>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeFetcher {
        fn returning(transactions: Vec<Transaction>) -> Self {
            Self {
                transactions,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                transactions: vec![],
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl TransactionFetcher for FakeFetcher {
        async fn list_transactions(&self, _user_id: &str) -> Result<Vec<Transaction>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ClientError::Api {
                    status: StatusCode::BAD_GATEWAY,
                    body: "upstream down".to_string(),
                });
            }
            Ok(self.transactions.clone())
        }
    }

    /// Cache whose `get` always reports a store failure.
    struct BrokenCache {
        inner: MemoryStatsCache,
        sets: Mutex<usize>,
    }

    #[async_trait]
    impl StatsCache for BrokenCache {
        async fn get(&self, _user_id: &str) -> Result<Option<FinanceStats>, CacheError> {
            Err(CacheError::Store("connection refused".to_string()))
        }

        async fn set(&self, stats: &FinanceStats) -> Result<(), CacheError> {
            *self.sets.lock().unwrap() += 1;
            self.inner.set(stats).await
        }
    }

    fn tx(id: i64, amount: i64) -> Transaction {
        Transaction {
            id,
            user_id: "u1".to_string(),
            amount: Decimal::from(amount),
            category: "Misc".to_string(),
            kind: TransactionKind::Income,
            created_at: datetime!(2024-05-01 12:00 UTC),
        }
    }

    #[tokio::test]
    async fn miss_fetches_computes_caches_then_hits() {
        let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(300)));
        let fetcher = Arc::new(FakeFetcher::returning(vec![tx(1, 100), tx(2, 50)]));
        let service = AnalyticsService::new(cache, fetcher.clone());

        let first = service.get_stats("u1").await.unwrap();
        assert_eq!(first.total_income, Decimal::from(150));
        assert_eq!(first.transactions_count, 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let second = service.get_stats("u1").await.unwrap();
        assert_eq!(second.total_income, first.total_income);
        assert_eq!(second.balance, first.balance);
        assert_eq!(second.transactions_count, first.transactions_count);
        // Served from cache; the fallback fetch did not run again.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_error_degrades_to_fetch_not_failure() {
        let cache = Arc::new(BrokenCache {
            inner: MemoryStatsCache::new(Duration::from_secs(300)),
            sets: Mutex::new(0),
        });
        let fetcher = Arc::new(FakeFetcher::returning(vec![tx(1, 10)]));
        let service = AnalyticsService::new(cache.clone(), fetcher.clone());

        let stats = service.get_stats("u1").await.unwrap();
        assert_eq!(stats.total_income, Decimal::from(10));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*cache.sets.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn fails_only_when_cache_misses_and_fetch_fails() {
        let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(300)));
        let fetcher = Arc::new(FakeFetcher::failing());
        let service = AnalyticsService::new(cache, fetcher);

        let err = service.get_stats("u1").await.unwrap_err();
        assert!(matches!(err, StatsError::Upstream(ClientError::Api { .. })));
    }

    #[tokio::test]
    async fn snapshot_refreshes_cache_without_any_read() {
        let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(300)));
        let fetcher = Arc::new(FakeFetcher::returning(vec![]));
        let service = AnalyticsService::new(cache.clone(), fetcher.clone());

        let snapshot = TransactionSnapshot {
            user_id: "u1".to_string(),
            transactions: vec![tx(1, 40)],
        };
        service.handle_snapshot(&snapshot).await.unwrap();

        // Pre-warmed: the read hits without touching the fetcher.
        let stats = service.get_stats("u1").await.unwrap();
        assert_eq!(stats.total_income, Decimal::from(40));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_snapshot_still_lands_under_the_owner_key() {
        let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(300)));
        let fetcher = Arc::new(FakeFetcher::returning(vec![]));
        let service = AnalyticsService::new(cache.clone(), fetcher);

        let snapshot = TransactionSnapshot {
            user_id: "u1".to_string(),
            transactions: vec![],
        };
        service.handle_snapshot(&snapshot).await.unwrap();

        let cached = cache.get("u1").await.unwrap().unwrap();
        assert_eq!(cached.user_id, "u1");
        assert_eq!(cached.transactions_count, 0);
        assert_eq!(cached.balance, Decimal::ZERO);
    }
}

use async_trait::async_trait;
use fintrack_sdk::objects::FinanceStats;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheError, StatsCache, stats_key};

struct CacheEntry {
    stats: FinanceStats,
    expires_at: Instant,
}

/// In-process TTL cache for computed stats.
///
/// Entries expire `ttl` after the write that created them; reads of an
/// expired entry behave like a miss, and the stale value is dropped lazily
/// on the next read or overwritten by the next set.
pub struct MemoryStatsCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StatsCache for MemoryStatsCache {
    async fn get(&self, user_id: &str) -> Result<Option<FinanceStats>, CacheError> {
        let key = stats_key(user_id);
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.stats.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired; drop it so the map does not accumulate dead owners.
        let mut entries = self.entries.write().await;
        if entries.get(&key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(&key);
        }
        Ok(None)
    }

    async fn set(&self, stats: &FinanceStats) -> Result<(), CacheError> {
        let entry = CacheEntry {
            stats: stats.clone(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .write()
            .await
            .insert(stats_key(&stats.user_id), entry);
        Ok(())
    }
}

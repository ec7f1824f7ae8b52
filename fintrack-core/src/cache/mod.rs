//! TTL-keyed store of the most recent computed stats per owner.
//!
//! A miss or an expired entry is a normal `Ok(None)`; an `Err` means the
//! cache store itself is unhealthy, which callers treat as a miss but log
//! distinctly.

pub mod memory;

pub use memory::MemoryStatsCache;

use async_trait::async_trait;
use fintrack_sdk::objects::FinanceStats;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(String),
}

/// Cache key for an owner's stats. Namespaced so the cache store can be
/// shared with other keyspaces.
pub fn stats_key(user_id: &str) -> String {
    format!("fintrack:stats:{user_id}")
}

#[async_trait]
pub trait StatsCache: Send + Sync {
    /// The cached stats if present and unexpired.
    async fn get(&self, user_id: &str) -> Result<Option<FinanceStats>, CacheError>;

    /// Unconditionally overwrite any prior entry; the TTL restarts on
    /// every write.
    async fn set(&self, stats: &FinanceStats) -> Result<(), CacheError>;
}

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

use super::topology::{ShardTopology, TopologyError};

/// Per-shard pool tuning. The acquire timeout is what turns pool
/// exhaustion into a visible error instead of a silent stall.
const MAX_POOL_CONNECTIONS: u32 = 10;
const MIN_POOL_CONNECTIONS: u32 = 1;
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60);
const MAX_CONNECTION_IDLE: Duration = Duration::from_secs(30 * 60);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// One shard descriptor as consumed from configuration.
#[derive(Debug, Clone)]
pub struct ShardConfig {
    pub name: String,
    pub url: String,
    pub buckets: usize,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("connect shard {name}: {source}")]
    Connect {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug)]
struct Shard {
    name: String,
    pool: PgPool,
}

/// Maps each owner to exactly one shard and its connection pool.
///
/// Pools are opened eagerly at construction, one per shard. If any pool
/// fails to open, the already-opened pools are closed and construction
/// fails, so a partial topology is never exposed. After construction the
/// routing table is immutable and lookups take no locks.
#[derive(Debug)]
pub struct ShardRouter {
    topology: ShardTopology,
    shards: Vec<Shard>,
}

impl ShardRouter {
    /// Open one pool per configured shard, in declaration order.
    pub async fn connect(configs: &[ShardConfig]) -> Result<Self, RouterError> {
        let buckets: Vec<usize> = configs.iter().map(|c| c.buckets).collect();
        let topology = ShardTopology::new(&buckets)?;

        let mut shards: Vec<Shard> = Vec::with_capacity(configs.len());
        for config in configs {
            match pool_options().connect(&config.url).await {
                Ok(pool) => {
                    tracing::info!(shard = %config.name, buckets = config.buckets, "shard pool opened");
                    shards.push(Shard {
                        name: config.name.clone(),
                        pool,
                    });
                }
                Err(source) => {
                    for opened in &shards {
                        opened.pool.close().await;
                    }
                    return Err(RouterError::Connect {
                        name: config.name.clone(),
                        source,
                    });
                }
            }
        }

        Ok(Self { topology, shards })
    }

    pub fn topology(&self) -> &ShardTopology {
        &self.topology
    }

    /// The bucket an owner hashes to.
    pub fn bucket_for_owner(&self, user_id: &str) -> usize {
        self.topology.bucket_for_owner(user_id)
    }

    /// The connection pool of the shard owning this owner's bucket.
    pub fn pool_for_owner(&self, user_id: &str) -> &PgPool {
        &self.shards[self.topology.shard_for_owner(user_id)].pool
    }

    /// The name of the shard owning this owner's bucket.
    pub fn shard_name_for_owner(&self, user_id: &str) -> &str {
        &self.shards[self.topology.shard_for_owner(user_id)].name
    }

    /// Every shard pool, in declaration order. Used for fan-out work such
    /// as migrations and shutdown.
    pub fn shards(&self) -> impl Iterator<Item = (&str, &PgPool)> {
        self.shards.iter().map(|s| (s.name.as_str(), &s.pool))
    }

    /// Close every pool. Idempotent; closing an already-closed pool is a
    /// no-op.
    pub async fn close(&self) {
        for shard in &self.shards {
            shard.pool.close().await;
            tracing::debug!(shard = %shard.name, "shard pool closed");
        }
    }
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .min_connections(MIN_POOL_CONNECTIONS)
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .idle_timeout(MAX_CONNECTION_IDLE)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

use thiserror::Error;

/// Errors raised when building a [`ShardTopology`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("no shards configured")]
    NoShards,

    #[error("total bucket count is zero")]
    NoBuckets,
}

/// Immutable bucket table mapping owners to shards.
///
/// Built once from the per-shard bucket counts in declaration order.
/// Bucket numbering is contiguous: shard 0 owns buckets `0..n0`, shard 1
/// owns `n0..n0+n1`, and so on. All lookups are pure functions.
#[derive(Debug, Clone)]
pub struct ShardTopology {
    /// bucket index -> owning shard index
    bucket_shards: Vec<usize>,
    shard_count: usize,
}

impl ShardTopology {
    /// Build the bucket table from per-shard bucket counts.
    ///
    /// Fails if the shard list is empty or the total bucket count is zero.
    /// A shard declared with zero buckets is kept in the topology but owns
    /// no owners.
    pub fn new(buckets_per_shard: &[usize]) -> Result<Self, TopologyError> {
        if buckets_per_shard.is_empty() {
            return Err(TopologyError::NoShards);
        }

        let total: usize = buckets_per_shard.iter().sum();
        if total == 0 {
            return Err(TopologyError::NoBuckets);
        }

        let mut bucket_shards = Vec::with_capacity(total);
        for (shard_index, &buckets) in buckets_per_shard.iter().enumerate() {
            bucket_shards.extend(std::iter::repeat_n(shard_index, buckets));
        }

        Ok(Self {
            bucket_shards,
            shard_count: buckets_per_shard.len(),
        })
    }

    pub fn total_buckets(&self) -> usize {
        self.bucket_shards.len()
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// The bucket an owner hashes to, in `[0, total_buckets)`.
    pub fn bucket_for_owner(&self, user_id: &str) -> usize {
        (hash_owner(user_id) % self.bucket_shards.len() as u64) as usize
    }

    /// The shard owning an owner's bucket.
    pub fn shard_for_owner(&self, user_id: &str) -> usize {
        self.bucket_shards[self.bucket_for_owner(user_id)]
    }

    /// The shard owning a given bucket, or `None` if out of range.
    pub fn shard_of_bucket(&self, bucket: usize) -> Option<usize> {
        self.bucket_shards.get(bucket).copied()
    }
}

/// FNV-1a, 64-bit. Stable across processes and releases, which is what
/// keeps owner-to-bucket assignment reproducible for a given topology.
fn hash_owner(user_id: &str) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for byte in user_id.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
